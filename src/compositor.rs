//! Turns a sprite sheet into a sequence of finished frames
//!
//! A [`RenderPlan`] does all the validation and measuring up front: grid, crop, canvas
//! size, and (with auto-align) the subject box of every frame. Only once that has
//! succeeded are frames drawn, one at a time, in playback order.

use crate::bbox::{content_bounds, FrameBoundingBox};
use crate::chroma::key_out;
use crate::collector::FrameSink;
use crate::color::{ChromaKeySpec, FillMode, KeyOutput};
use crate::draw::{downsample, draw_region, new_canvas, Placement};
use crate::error::*;
use crate::geometry::{RenderGeometry, SourceRect};
use crate::grid::{self, FrameSlot};
use crate::progress::AbortFlag;
use crate::settings::{AlignMode, Settings};
use imgref::{ImgRef, ImgVec};
use rgb::{RGB8, RGBA8};

const WHITE: RGBA8 = RGBA8::new(255, 255, 255, 255);
const CLEAR: RGBA8 = RGBA8::new(0, 0, 0, 0);

/// What happened during a render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderReport {
    pub frames_written: usize,
    pub width: u32,
    pub height: u32,
    pub delay_ms: u32,
    /// Sheet indices of frames where auto-align found nothing but background.
    /// They were drawn without re-centering.
    pub missing_content: Vec<u32>,
}

/// Everything needed to draw the frames, measured once per render
pub struct RenderPlan<'a> {
    sheet: ImgRef<'a, RGBA8>,
    settings: &'a Settings,
    geometry: RenderGeometry,
    slots: Vec<FrameSlot>,
    /// One per slot when auto-aligning, otherwise empty
    boxes: Vec<Option<FrameBoundingBox>>,
    key: Option<ChromaKeySpec>,
}

impl<'a> RenderPlan<'a> {
    /// Fails without drawing anything if the settings can't produce a valid animation.
    ///
    /// `key_output` chooses how keyed pixels are marked: alpha 0 for sinks that keep alpha,
    /// or an opaque sentinel color for the GIF writer.
    pub fn new(sheet: ImgRef<'a, RGBA8>, settings: &'a Settings, key_output: KeyOutput) -> GifResult<Self> {
        settings.validate()?;
        let mut geometry = RenderGeometry::resolve(sheet.width(), sheet.height(), settings)?;
        let slots = grid::sequence(settings)?;

        let key = settings.transparent.map(|target| {
            let fill = if settings.flood_fill { FillMode::Flood } else { FillMode::Global };
            ChromaKeySpec::new(target, settings.tolerance, fill, key_output)
        });

        let mut boxes = Vec::new();
        if settings.auto_align {
            let target = settings.transparent;
            let tolerance_sq = key.map_or(0, |k| k.tolerance_sq);
            boxes = slots.iter().map(|&slot| {
                let frame = Self::frame_pixels(sheet, geometry.frame_rect(slot, settings));
                content_bounds(frame, target, tolerance_sq)
            }).collect();

            let (max_width, max_height) = boxes.iter().flatten()
                .fold((0, 0), |(w, h), b| (b.width.max(w), b.height.max(h)));
            if max_width > 0 && max_height > 0 {
                let margin = f64::from(settings.align_margin);
                geometry = geometry.with_content_size(max_width as f64 + margin, max_height as f64 + margin)?;
            }
        }

        log::debug!("{} frames, cell {:.1}×{:.1}, canvas {}×{}, output {}×{}",
            slots.len(), geometry.cell_width, geometry.cell_height,
            geometry.logical_width, geometry.logical_height, geometry.output_width, geometry.output_height);

        Ok(Self { sheet, settings, geometry, slots, boxes, key })
    }

    fn frame_pixels(sheet: ImgRef<'_, RGBA8>, rect: SourceRect) -> ImgRef<'_, RGBA8> {
        let (x, y, width, height) = rect.to_pixels(sheet.width(), sheet.height());
        sheet.sub_image(x, y, width, height)
    }

    #[must_use]
    pub fn geometry(&self) -> &RenderGeometry {
        &self.geometry
    }

    #[must_use]
    pub fn slots(&self) -> &[FrameSlot] {
        &self.slots
    }

    /// Number of frames that will be emitted
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Key color the GIF writer must treat as transparent, if keying writes a sentinel
    #[must_use]
    pub fn sentinel(&self) -> Option<RGB8> {
        self.key.filter(|k| k.output == KeyOutput::Sentinel).map(|k| k.key)
    }

    /// Frames where auto-align found no content
    #[must_use]
    pub fn missing_content(&self) -> Vec<u32> {
        self.slots.iter().zip(&self.boxes)
            .filter(|(_, b)| b.is_none())
            .map(|(slot, _)| slot.index)
            .collect()
    }

    /// Draws the `n`th frame of the sequence at output resolution
    pub fn render_frame(&self, n: usize) -> GifResult<ImgVec<RGBA8>> {
        let slot = *self.slots.get(n).ok_or(Error::EmptySequence)?;
        let geom = &self.geometry;
        let logical_width = geom.logical_width as usize;
        let logical_height = geom.logical_height as usize;

        // white under opaque art, so encoders without alpha get a clean background
        let fill = if self.key.is_some() { CLEAR } else { WHITE };
        let mut canvas = new_canvas(logical_width, logical_height, fill)?;

        let rect = geom.frame_rect(slot, self.settings);
        match self.boxes.get(n).copied().flatten() {
            Some(bbox) => {
                let (x, y, _, _) = rect.to_pixels(self.sheet.width(), self.sheet.height());
                let src = SourceRect {
                    x: (x + bbox.min_x) as f64,
                    y: (y + bbox.min_y) as f64,
                    width: bbox.width as f64,
                    height: bbox.height as f64,
                };
                let dst = self.aligned_placement(bbox);
                draw_region(&mut canvas, self.sheet, src, dst);
            },
            None => {
                let dst = Placement { x: 0, y: 0, width: logical_width, height: logical_height };
                draw_region(&mut canvas, self.sheet, rect, dst);
            },
        }

        if let Some(key) = &self.key {
            key_out(&mut canvas, key);
        }

        if geom.needs_resize() {
            // smoothing would blend the key color into the subject's edge
            let smooth = self.key.is_none();
            canvas = downsample(canvas.as_ref(), geom.output_width as usize, geom.output_height as usize, smooth)?;
        }
        Ok(canvas)
    }

    /// Subject scaled like the rest of the frame, centered horizontally,
    /// and centered or standing on the bottom edge vertically.
    fn aligned_placement(&self, bbox: FrameBoundingBox) -> Placement {
        let scale = self.geometry.scale;
        let canvas_width = i64::from(self.geometry.logical_width);
        let canvas_height = i64::from(self.geometry.logical_height);
        let width = ((bbox.width as f64 * scale).floor() as usize).max(1);
        let height = ((bbox.height as f64 * scale).floor() as usize).max(1);

        let x = (canvas_width - width as i64).div_euclid(2);
        let y = match self.settings.align_mode {
            AlignMode::Center => (canvas_height - height as i64).div_euclid(2),
            AlignMode::Bottom => canvas_height - height as i64,
        };
        Placement { x, y, width, height }
    }

    /// Draws every frame and hands them to `sink` in playback order.
    ///
    /// `abort` is checked before each frame.
    pub fn render(&self, sink: &mut dyn FrameSink, abort: &AbortFlag) -> GifResult<RenderReport> {
        let delay_ms = self.settings.delay_ms();
        let missing_content = self.missing_content();
        for index in &missing_content {
            log::warn!("frame {index} has no content to align; drawing it as-is");
        }

        for n in 0..self.slots.len() {
            if abort.is_aborted() {
                return Err(Error::Aborted);
            }
            let frame = self.render_frame(n)?;
            sink.add_frame(frame, delay_ms)?;
        }

        Ok(RenderReport {
            frames_written: self.slots.len(),
            width: self.geometry.output_width,
            height: self.geometry.output_height,
            delay_ms,
            missing_content,
        })
    }
}

/// Renders all frames of `sheet` into `sink`. Keyed pixels get alpha 0.
pub fn render(sheet: ImgRef<'_, RGBA8>, settings: &Settings, sink: &mut dyn FrameSink, abort: &AbortFlag) -> GifResult<RenderReport> {
    RenderPlan::new(sheet, settings, KeyOutput::Alpha)?.render(sink, abort)
}
