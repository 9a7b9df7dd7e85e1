use crate::color::distance_sq;
use imgref::ImgRef;
use rgb::{RGB8, RGBA8};

/// Tightest box around a frame's subject, in the frame's own pixel coordinates.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameBoundingBox {
    pub min_x: usize,
    pub min_y: usize,
    pub width: usize,
    pub height: usize,
}

impl FrameBoundingBox {
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> usize {
        self.min_y + self.height
    }
}

/// Finds the box around everything that isn't background.
///
/// A pixel is content if it's not fully transparent and, when a `target` background color
/// is given, further than `tolerance_sq` from it. This is the same test the chroma-key
/// uses, so sizing and keying agree on what the background is.
///
/// Returns `None` if the frame has no content at all.
#[must_use]
pub fn content_bounds(frame: ImgRef<'_, RGBA8>, target: Option<RGB8>, tolerance_sq: u32) -> Option<FrameBoundingBox> {
    let mut min_x = usize::MAX;
    let mut min_y = usize::MAX;
    let mut max_x = 0;
    let mut max_y = 0;

    for (y, row) in frame.rows().enumerate() {
        for (x, px) in row.iter().enumerate() {
            if px.a == 0 {
                continue;
            }
            if let Some(target) = target {
                if distance_sq(RGB8::new(px.r, px.g, px.b), target) <= tolerance_sq {
                    continue;
                }
            }
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if min_x == usize::MAX {
        return None;
    }
    Some(FrameBoundingBox {
        min_x,
        min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}
