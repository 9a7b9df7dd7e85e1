//! Everything the user can configure about a render
//!
//! `Settings` is an immutable value: the caller owns it and passes it by reference
//! into every render. Editing means building a new one.

use crate::error::*;
use crate::grid::ReadOrder;
use rgb::RGB8;
use std::collections::BTreeSet;

pub use gif::Repeat;

/// Longest side of the output when `max_resolution` is on
pub const MAX_RESOLUTION: u32 = 1024;

/// Extra room (in source pixels) around the largest subject when auto-aligning
pub const DEFAULT_ALIGN_MARGIN: u32 = 2;

/// How the detected subject is placed on the canvas when auto-aligning
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum AlignMode {
    /// Centered both horizontally and vertically
    #[default]
    Center,
    /// Centered horizontally, feet on the canvas bottom. Stops walk cycles from bobbing.
    Bottom,
}

/// Margins trimmed off every grid cell, in source pixels
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct CropMargins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub rows: u32,
    pub cols: u32,
    /// Frames at this index or later are never emitted
    pub total_frames: u32,
    /// Indices skipped even if below `total_frames`
    pub excluded_frames: BTreeSet<u32>,
    pub read_order: ReadOrder,
    pub crop: CropMargins,
    /// Upscale factor of the working canvas, typically 0.5-4
    pub scale: f64,
    pub fps: f64,
    /// Color to key out. `None` disables transparency.
    pub transparent: Option<RGB8>,
    /// 0-100, percent of the largest possible RGB distance
    pub tolerance: f64,
    /// Only key out background connected to the frame border
    pub flood_fill: bool,
    pub auto_align: bool,
    pub align_mode: AlignMode,
    /// Margin around the largest subject when auto-aligning
    pub align_margin: u32,
    /// Limit the longest side to `MAX_RESOLUTION`
    pub max_resolution: bool,
    /// 1-100
    pub quality: u8,
    pub repeat: Repeat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rows: 1,
            cols: 1,
            total_frames: 1,
            excluded_frames: BTreeSet::new(),
            read_order: ReadOrder::RowMajor,
            crop: CropMargins::default(),
            scale: 1.,
            fps: 10.,
            transparent: None,
            tolerance: 10.,
            flood_fill: true,
            auto_align: false,
            align_mode: AlignMode::Center,
            align_margin: DEFAULT_ALIGN_MARGIN,
            max_resolution: false,
            quality: 100,
            repeat: Repeat::Infinite,
        }
    }
}

impl Settings {
    /// Grid of `rows`×`cols` with every cell used as a frame
    pub fn grid(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            total_frames: rows.saturating_mul(cols),
            ..Self::default()
        }
    }

    /// Checks everything that doesn't depend on the sprite sheet itself
    pub fn validate(&self) -> GifResult<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::InvalidGrid(format!("rows and columns must be at least 1 (got {}×{})", self.rows, self.cols)));
        }
        let cells = u64::from(self.rows) * u64::from(self.cols);
        if u64::from(self.total_frames) > cells {
            return Err(Error::InvalidGrid(format!("frame count {} is larger than the {} cells of a {}×{} grid",
                self.total_frames, cells, self.rows, self.cols)));
        }
        if !(self.scale.is_finite() && self.scale > 0.) {
            return Err(Error::InvalidScale(self.scale));
        }
        if !(self.fps.is_finite() && self.fps > 0.) {
            return Err(Error::InvalidFps(self.fps));
        }
        if !(0. ..=100.).contains(&self.tolerance) {
            return Err(Error::InvalidTolerance(self.tolerance));
        }
        let crop = &self.crop;
        if [crop.top, crop.bottom, crop.left, crop.right].iter().any(|m| !(m.is_finite() && *m >= 0.)) {
            return Err(Error::NegativeCrop);
        }
        Ok(())
    }

    /// Per-frame delay in whole milliseconds
    #[must_use]
    pub fn delay_ms(&self) -> u32 {
        (1000. / self.fps).round() as u32
    }

    pub(crate) fn color_quality(&self) -> u8 {
        self.quality.clamp(1, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Settings::default().validate().unwrap();
        assert_eq!(Settings::grid(2, 3).total_frames, 6);
    }

    #[test]
    fn delay_rounds() {
        let s = Settings { fps: 12., ..Settings::default() };
        assert_eq!(s.delay_ms(), 83);
        let s = Settings { fps: 8., ..Settings::default() };
        assert_eq!(s.delay_ms(), 125);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(Settings { rows: 0, ..Settings::default() }.validate(), Err(Error::InvalidGrid(_))));
        assert!(matches!(Settings { total_frames: 5, ..Settings::grid(2, 2) }.validate(), Err(Error::InvalidGrid(_))));
        assert!(matches!(Settings { scale: 0., ..Settings::default() }.validate(), Err(Error::InvalidScale(_))));
        assert!(matches!(Settings { fps: -1., ..Settings::default() }.validate(), Err(Error::InvalidFps(_))));
        assert!(matches!(Settings { tolerance: 101., ..Settings::default() }.validate(), Err(Error::InvalidTolerance(_))));
    }
}
