//! Where rendered frames go
//!
//! [`spritegif::new()`][crate::new] returns the [`Collector`] that collects animation frames,
//! and a [`Writer`][crate::Writer] that performs compression and I/O.

pub use imgref::ImgVec;
pub use rgb::{RGB8, RGBA8};

use crate::error::*;
use crossbeam_channel::Sender;

#[cfg(feature = "png")]
use std::path::PathBuf;

/// Receives finished frames, in the order they're played
pub trait FrameSink {
    /// `delay_ms` is how long the frame stays on screen
    fn add_frame(&mut self, image: ImgVec<RGBA8>, delay_ms: u32) -> GifResult<()>;
}

pub(crate) struct InputFrame {
    pub image: ImgVec<RGBA8>,
    pub delay_ms: u32,
}

/// Collect frames that will be encoded
///
/// Note that writing will finish only when the collector is dropped.
/// Collect frames on another thread, or call `drop(collector)` before calling `writer.write()`!
pub struct Collector {
    pub(crate) queue: Sender<InputFrame>,
    pub(crate) width: usize,
    pub(crate) height: usize,
}

impl FrameSink for Collector {
    /// Frames must be added in playback order, and all must have the canvas size given to [`crate::new()`].
    ///
    /// If this function appears to be stuck after a few frames, it's because [`crate::Writer::write()`] is not running.
    fn add_frame(&mut self, image: ImgVec<RGBA8>, delay_ms: u32) -> GifResult<()> {
        if image.width() != self.width || image.height() != self.height {
            return Err(Error::WrongSize(format!("Frame has wrong size ({}×{}, expected {}×{})",
                image.width(), image.height(), self.width, self.height)));
        }
        self.queue.send(InputFrame { image, delay_ms })?;
        Ok(())
    }
}

/// Keeps frames in memory, for previews and tests
#[derive(Default)]
pub struct FrameList {
    pub frames: Vec<(ImgVec<RGBA8>, u32)>,
}

impl FrameSink for FrameList {
    fn add_frame(&mut self, image: ImgVec<RGBA8>, delay_ms: u32) -> GifResult<()> {
        self.frames.push((image, delay_ms));
        Ok(())
    }
}

/// Saves every frame as a numbered PNG file in a directory
#[cfg(feature = "png")]
pub struct PngSequence {
    dir: PathBuf,
    written: usize,
}

#[cfg(feature = "png")]
impl PngSequence {
    pub fn new(dir: impl Into<PathBuf>) -> GifResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, written: 0 })
    }

    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }
}

#[cfg(feature = "png")]
impl FrameSink for PngSequence {
    fn add_frame(&mut self, image: ImgVec<RGBA8>, _delay_ms: u32) -> GifResult<()> {
        let path = self.dir.join(format!("frame_{:04}.png", self.written));
        let (buf, width, height) = image.into_contiguous_buf();
        lodepng::encode32_file(&path, &buf, width, height)
            .map_err(|err| Error::PNG(format!("Can't write {}: {}", path.display(), err)))?;
        self.written += 1;
        Ok(())
    }
}
