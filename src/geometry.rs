//! Canvas sizes shared by every frame of a render
//!
//! There are four nested spaces: the grid cell in the sheet, the cropped frame,
//! the logical canvas (cropped × scale) where drawing, keying and alignment happen,
//! and the output canvas (logical × resize ratio) that gets encoded.

use crate::error::*;
use crate::grid::FrameSlot;
use crate::settings::{Settings, MAX_RESOLUTION};

/// Source rectangle in sheet pixels. Fractional, because cells needn't divide the sheet evenly.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SourceRect {
    /// Whole-pixel `(x, y, width, height)` inside a `sheet_width`×`sheet_height` sheet.
    ///
    /// Edges are truncated and the size is at least 1px unless the rect is entirely off the sheet.
    #[must_use]
    pub fn to_pixels(&self, sheet_width: usize, sheet_height: usize) -> (usize, usize, usize, usize) {
        let x = (self.x.max(0.).floor() as usize).min(sheet_width);
        let y = (self.y.max(0.).floor() as usize).min(sheet_height);
        let width = (self.width.floor().max(1.) as usize).min(sheet_width - x);
        let height = (self.height.floor().max(1.) as usize).min(sheet_height - y);
        (x, y, width, height)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderGeometry {
    pub cell_width: f64,
    pub cell_height: f64,
    /// Cell minus crop margins. Overridden by the subject size when auto-aligning.
    pub cropped_width: f64,
    pub cropped_height: f64,
    pub logical_width: u32,
    pub logical_height: u32,
    pub output_width: u32,
    pub output_height: u32,
    /// 1.0 unless the output had to be shrunk to fit `MAX_RESOLUTION`
    pub resize_ratio: f64,
    pub scale: f64,
    max_resolution: bool,
}

impl RenderGeometry {
    /// Computed once per render from the sheet size and settings
    pub fn resolve(sheet_width: usize, sheet_height: usize, settings: &Settings) -> GifResult<Self> {
        if sheet_width == 0 || sheet_height == 0 {
            return Err(Error::CanvasAllocation(format!("sprite sheet is empty ({sheet_width}×{sheet_height})")));
        }
        if settings.rows == 0 || settings.cols == 0 {
            return Err(Error::InvalidGrid(format!("rows and columns must be at least 1 (got {}×{})", settings.rows, settings.cols)));
        }
        let cell_width = sheet_width as f64 / f64::from(settings.cols);
        let cell_height = sheet_height as f64 / f64::from(settings.rows);
        let crop = &settings.crop;
        let cropped_width = cell_width - crop.left - crop.right;
        let cropped_height = cell_height - crop.top - crop.bottom;
        if !(cropped_width > 0. && cropped_height > 0.) {
            return Err(Error::InvalidCrop(cropped_width, cropped_height));
        }

        let mut geom = Self {
            cell_width,
            cell_height,
            cropped_width,
            cropped_height,
            logical_width: 0,
            logical_height: 0,
            output_width: 0,
            output_height: 0,
            resize_ratio: 1.,
            scale: settings.scale,
            max_resolution: settings.max_resolution,
        };
        geom.rescale()?;
        Ok(geom)
    }

    /// Same geometry, but with the canvas sized to fit the given content (in cropped-frame pixels)
    pub fn with_content_size(&self, width: f64, height: f64) -> GifResult<Self> {
        if !(width > 0. && height > 0.) {
            return Err(Error::CanvasAllocation(format!("content size {width}×{height} is empty")));
        }
        let mut geom = Self {
            cropped_width: width,
            cropped_height: height,
            ..*self
        };
        geom.rescale()?;
        Ok(geom)
    }

    fn rescale(&mut self) -> GifResult<()> {
        let logical_width = (self.cropped_width * self.scale).floor();
        let logical_height = (self.cropped_height * self.scale).floor();
        if !(logical_width >= 1. && logical_height >= 1.) || logical_width > f64::from(u32::MAX) || logical_height > f64::from(u32::MAX) {
            return Err(Error::CanvasAllocation(format!("scaled frame would be {logical_width}×{logical_height}px")));
        }
        self.logical_width = logical_width as u32;
        self.logical_height = logical_height as u32;

        let longest = self.logical_width.max(self.logical_height);
        if self.max_resolution && longest > MAX_RESOLUTION {
            self.resize_ratio = f64::from(MAX_RESOLUTION) / f64::from(longest);
            // integer math, so both sides floor the same way
            let fit = |side: u32| (u64::from(side) * u64::from(MAX_RESOLUTION) / u64::from(longest)) as u32;
            self.output_width = fit(self.logical_width);
            self.output_height = fit(self.logical_height);
        } else {
            self.resize_ratio = 1.;
            self.output_width = self.logical_width;
            self.output_height = self.logical_height;
        }
        if self.output_width == 0 || self.output_height == 0 {
            return Err(Error::CanvasAllocation(format!("output frame would be {}×{}px", self.output_width, self.output_height)));
        }
        Ok(())
    }

    /// The cropped frame of a cell, in sheet coordinates
    #[must_use]
    pub fn frame_rect(&self, slot: FrameSlot, settings: &Settings) -> SourceRect {
        SourceRect {
            x: f64::from(slot.col) * self.cell_width + settings.crop.left,
            y: f64::from(slot.row) * self.cell_height + settings.crop.top,
            width: self.cell_width - settings.crop.left - settings.crop.right,
            height: self.cell_height - settings.crop.top - settings.crop.bottom,
        }
    }

    #[must_use]
    pub fn needs_resize(&self) -> bool {
        self.resize_ratio < 1.
    }
}
