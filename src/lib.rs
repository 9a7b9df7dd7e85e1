/*
 spritegif sprite sheet to GIF converter

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as
 published by the Free Software Foundation, either version 3 of the
 License, or (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/
//! Cuts a sprite sheet into frames and encodes them as an animated GIF.
//!
//! ```rust,no_run
//! # fn main() -> spritegif::GifResult<()> {
//! let sheet = spritegif::decode_png_file("walk.png")?;
//! let settings = spritegif::Settings::grid(2, 4);
//! let (gif, _report) = spritegif::encode_to_vec(sheet.as_ref(), &settings,
//!     &mut spritegif::progress::NoProgress {}, &spritegif::progress::AbortFlag::new())?;
//! std::fs::write("walk.gif", gif)?;
//! # Ok(()) }
//! ```

use imgref::*;
use rgb::*;

mod error;
pub use crate::error::*;
pub mod progress;
use crate::progress::*;
pub mod collector;
pub use crate::collector::*;
mod settings;
pub use crate::settings::*;
pub mod grid;
pub mod geometry;
pub mod color;
pub mod chroma;
pub mod bbox;
pub mod draw;
pub mod compositor;
pub use crate::compositor::{render, RenderPlan, RenderReport};
pub mod estimate;
mod encoderust;

use crate::color::KeyOutput;
use crossbeam_channel::Receiver;
use std::cell::Cell;
use std::io::prelude::*;
use std::rc::Rc;

#[cfg(feature = "png")]
use std::path::Path;

/// How the GIF stream is set up. Fixed for the whole animation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EncoderSettings {
    /// Canvas size; every frame must match it
    pub width: u32,
    pub height: u32,
    /// Opaque color that means "transparent" in submitted frames
    pub key_color: Option<RGB8>,
    /// 1-100
    pub quality: u8,
    pub repeat: Repeat,
    /// For progress reporting
    pub total_frames: Option<u64>,
}

/// Perform GIF writing
pub struct Writer {
    queue: Receiver<InputFrame>,
    settings: EncoderSettings,
}

struct GIFFrame {
    image: ImgVec<u8>,
    pal: Vec<RGBA8>,
    /// In 1/100ths of a second
    delay: u16,
    transparent_index: Option<u8>,
}

/// Start new encoding
///
/// The `Collector` and `Writer` can be used on separate threads.
/// Frames are written in the order they're added.
pub fn new(settings: EncoderSettings) -> GifResult<(Collector, Writer)> {
    if settings.width == 0 || settings.height == 0 || settings.width > u32::from(u16::MAX) || settings.height > u32::from(u16::MAX) {
        return Err(Error::WrongSize(format!("GIF canvas can't be {}×{}", settings.width, settings.height)));
    }
    let (queue, queue_iter) = crossbeam_channel::bounded(4);

    Ok((
        Collector {
            queue,
            width: settings.width as usize,
            height: settings.height as usize,
        },
        Writer {
            queue: queue_iter,
            settings,
        },
    ))
}

/// Encode collected frames
impl Writer {
    fn quantize(image: ImgRef<'_, RGBA8>, settings: &EncoderSettings) -> GifResult<(ImgVec<u8>, Vec<RGBA8>)> {
        let mut liq = imagequant::new();
        liq.set_quality(0, settings.quality.clamp(1, 100))?;
        let pixels = Self::binary_alpha(image, settings.key_color);
        let mut img = liq.new_image(pixels, image.width(), image.height(), 0.)?;
        img.add_fixed_color(RGBA8::new(0, 0, 0, 0))?;
        let mut res = liq.quantize(&mut img)?;
        // dithering smears pixel art
        res.set_dithering_level(0.)?;

        let (pal, pal_img) = res.remapped(&mut img)?;
        debug_assert_eq!(img.width() * img.height(), pal_img.len());

        Ok((Img::new(pal_img, img.width(), img.height()), pal))
    }

    /// GIF transparency is all or nothing. Key color and alpha below the dither threshold become transparent.
    fn binary_alpha(image: ImgRef<'_, RGBA8>, key_color: Option<RGB8>) -> Vec<RGBA8> {
        const DITHER: [u8; 64] = [
         0*2+8,48*2+8,12*2+8,60*2+8, 3*2+8,51*2+8,15*2+8,63*2+8,
        32*2+8,16*2+8,44*2+8,28*2+8,35*2+8,19*2+8,47*2+8,31*2+8,
         8*2+8,56*2+8, 4*2+8,52*2+8,11*2+8,59*2+8, 7*2+8,55*2+8,
        40*2+8,24*2+8,36*2+8,20*2+8,43*2+8,27*2+8,39*2+8,23*2+8,
         2*2+8,50*2+8,14*2+8,62*2+8, 1*2+8,49*2+8,13*2+8,61*2+8,
        34*2+8,18*2+8,46*2+8,30*2+8,33*2+8,17*2+8,45*2+8,29*2+8,
        10*2+8,58*2+8, 6*2+8,54*2+8, 9*2+8,57*2+8, 5*2+8,53*2+8,
        42*2+8,26*2+8,38*2+8,22*2+8,41*2+8,25*2+8,37*2+8,21*2+8];

        let mut out = Vec::with_capacity(image.width() * image.height());
        for (y, row) in image.rows().enumerate() {
            out.extend(row.iter().enumerate().map(|(x, &px)| {
                let is_key = px.a == 255 && key_color.map_or(false, |k| k.r == px.r && k.g == px.g && k.b == px.b);
                if is_key || px.a < DITHER[(y & 7) * 8 + (x & 7)] {
                    RGBA8::new(0, 0, 0, 0)
                } else {
                    RGBA8::new(px.r, px.g, px.b, 255)
                }
            }));
        }
        out
    }

    fn make_frame(input: InputFrame, settings: &EncoderSettings) -> GifResult<GIFFrame> {
        let (image, pal) = Self::quantize(input.image.as_ref(), settings)?;
        let transparent_index = pal.iter().position(|p| p.a == 0).map(|i| i as u8);
        Ok(GIFFrame {
            image,
            pal,
            delay: delay_centiseconds(input.delay_ms),
            transparent_index,
        })
    }

    /// Start writing frames. This function will not return until `Collector` is dropped.
    ///
    /// `outfile` can be any writer, such as `File` or `&mut Vec`.
    ///
    /// `ProgressReporter.increase()` is called each time a new frame is being written.
    pub fn write<W: Write>(self, writer: W, reporter: &mut dyn ProgressReporter) -> GifResult<W> {
        let written = Rc::new(Cell::new(0));
        let mut enc = encoderust::RustEncoder::new(writer, written.clone());
        let total = self.settings.total_frames;
        let mut n = 0_u64;

        for input in &self.queue {
            let frame = Self::make_frame(input, &self.settings)?;
            let frame = encoderust::RustEncoder::<W>::compress_frame(frame)?;
            enc.write_frame(&frame, &self.settings)?;
            n += 1;

            reporter.written_bytes(written.get());
            if let Some(total) = total.filter(|&t| t > 0) {
                reporter.progress((n as f32 / total as f32).min(1.));
            }
            if !reporter.increase() {
                return Err(Error::Aborted);
            }
        }
        if n == 0 {
            return Err(Error::EmptySequence);
        }
        enc.finish()
    }
}

/// GIF delays are in 1/100ths of a second, and 0 means "as fast as possible" to browsers
#[must_use]
pub fn delay_centiseconds(delay_ms: u32) -> u16 {
    (delay_ms.saturating_add(5) / 10).clamp(1, u32::from(u16::MAX)) as u16
}

/// Renders the sheet and encodes it to a GIF in memory.
///
/// Rendering runs on its own thread, feeding the encoder in playback order.
/// On failure nothing is returned, so there's no half-written file to clean up.
pub fn encode_to_vec(sheet: ImgRef<'_, RGBA8>, settings: &Settings, reporter: &mut dyn ProgressReporter, abort: &AbortFlag) -> GifResult<(Vec<u8>, RenderReport)> {
    let plan = RenderPlan::new(sheet, settings, KeyOutput::Sentinel)?;
    let geom = plan.geometry();
    let (mut collector, writer) = new(EncoderSettings {
        width: geom.output_width,
        height: geom.output_height,
        key_color: plan.sentinel(),
        quality: settings.color_quality(),
        repeat: settings.repeat,
        total_frames: Some(plan.len() as u64),
    })?;

    std::thread::scope(|scope| {
        let render_thread = std::thread::Builder::new().name("render".into()).spawn_scoped(scope, move || {
            plan.render(&mut collector, abort)
        })?;
        let written = writer.write(Vec::new(), reporter);
        let rendered = render_thread.join().map_err(|_| Error::ThreadSend)?;
        // a failed writer drops the queue, so the renderer only sees a closed channel
        let report = match rendered {
            Err(Error::ThreadSend) => return Err(written.err().unwrap_or(Error::ThreadSend)),
            // a failed render closes the queue early, which the writer sees as a normal end
            other => other?,
        };
        let out = written?;
        reporter.done(&format!("{} frames, {}×{}", report.frames_written, report.width, report.height));
        Ok((out, report))
    })
}

/// Read and decode a sprite sheet PNG from disk
#[cfg(feature = "png")]
pub fn decode_png_file(path: impl AsRef<Path>) -> GifResult<ImgVec<RGBA8>> {
    let path = path.as_ref();
    let image = lodepng::decode32_file(path)
        .map_err(|err| Error::PNG(format!("Can't load {}: {}", path.display(), err)))?;
    Ok(ImgVec::new(image.buffer, image.width, image.height))
}

/// Decode a sprite sheet from in-memory PNG data
#[cfg(feature = "png")]
pub fn decode_png_memory(png_data: &[u8]) -> GifResult<ImgVec<RGBA8>> {
    let image = lodepng::decode32(png_data)
        .map_err(|err| Error::PNG(format!("Can't decode PNG: {err}")))?;
    Ok(ImgVec::new(image.buffer, image.width, image.height))
}

#[test]
fn delays() {
    assert_eq!(delay_centiseconds(100), 10);
    assert_eq!(delay_centiseconds(83), 8);
    assert_eq!(delay_centiseconds(125), 13);
    assert_eq!(delay_centiseconds(0), 1);
}

#[test]
fn key_color_becomes_transparent() {
    let key = RGB8::new(255, 0, 255);
    let img = ImgVec::new(vec![RGBA8::new(255, 0, 255, 255), RGBA8::new(255, 0, 254, 255), RGBA8::new(9, 9, 9, 0)], 3, 1);
    let px = Writer::binary_alpha(img.as_ref(), Some(key));
    assert_eq!(px[0].a, 0);
    assert_eq!(px[1], RGBA8::new(255, 0, 254, 255));
    assert_eq!(px[2].a, 0);
}

#[test]
fn writer_rejects_wrong_size() {
    let (mut c, _w) = new(EncoderSettings { width: 4, height: 4, key_color: None, quality: 100, repeat: Repeat::Infinite, total_frames: None }).unwrap();
    assert!(matches!(c.add_frame(ImgVec::new(vec![RGBA8::default(); 6], 3, 2), 100), Err(Error::WrongSize(_))));
}
