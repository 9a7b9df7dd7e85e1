//! Pixel pushing: copying sheet regions onto the canvas, and the final downscale

use crate::error::*;
use crate::geometry::SourceRect;
use imgref::{ImgRef, ImgVec};
use rgb::RGBA8;

/// Where a region lands on the canvas. May hang off the edges; those pixels are dropped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: usize,
    pub height: usize,
}

/// Allocates a canvas, failing instead of aborting when it can't be had
pub fn new_canvas(width: usize, height: usize, fill: RGBA8) -> GifResult<ImgVec<RGBA8>> {
    let len = width.checked_mul(height)
        .filter(|&len| len > 0)
        .ok_or_else(|| Error::CanvasAllocation(format!("{width}×{height}px canvas")))?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::CanvasAllocation(format!("out of memory for a {width}×{height}px canvas")))?;
    buf.resize(len, fill);
    Ok(ImgVec::new(buf, width, height))
}

/// Draws `src` (in sheet coordinates) stretched to `dst`, nearest-neighbor, source-over.
///
/// Fractional source edges are truncated here, per frame, so cells that don't divide
/// the sheet evenly still sample from the right pixels.
pub fn draw_region(canvas: &mut ImgVec<RGBA8>, sheet: ImgRef<'_, RGBA8>, src: SourceRect, dst: Placement) {
    let (sx, sy, sw, sh) = src.to_pixels(sheet.width(), sheet.height());
    if sw == 0 || sh == 0 || dst.width == 0 || dst.height == 0 {
        return;
    }
    let region = sheet.sub_image(sx, sy, sw, sh);

    let cw = canvas.width() as i64;
    let ch = canvas.height() as i64;
    for dy in 0..dst.height {
        let cy = dst.y + dy as i64;
        if cy < 0 || cy >= ch {
            continue;
        }
        // sample at the pixel center
        let ry = ((2 * dy + 1) * sh / (2 * dst.height)).min(sh - 1);
        let src_row = &region[ry];
        let out_row = &mut canvas[cy as usize];
        for dx in 0..dst.width {
            let cx = dst.x + dx as i64;
            if cx < 0 || cx >= cw {
                continue;
            }
            let rx = ((2 * dx + 1) * sw / (2 * dst.width)).min(sw - 1);
            let out = &mut out_row[cx as usize];
            *out = source_over(src_row[rx], *out);
        }
    }
}

#[inline]
fn source_over(src: RGBA8, dst: RGBA8) -> RGBA8 {
    match src.a {
        255 => src,
        0 => dst,
        _ if dst.a == 0 => src,
        _ => {
            let sa = u32::from(src.a);
            let da = u32::from(dst.a) * (255 - sa);
            // alpha scaled by 255
            let out_a = sa * 255 + da;
            let mix = |s: u8, d: u8| ((u32::from(s) * sa * 255 + u32::from(d) * da + out_a / 2) / out_a) as u8;
            RGBA8::new(mix(src.r, dst.r), mix(src.g, dst.g), mix(src.b, dst.b), ((out_a + 127) / 255) as u8)
        },
    }
}

/// Shrinks the logical canvas to the output size.
///
/// Without `smooth` it's nearest-neighbor, which never mixes keyed pixels into the subject's edge.
pub fn downsample(canvas: ImgRef<'_, RGBA8>, width: usize, height: usize, smooth: bool) -> GifResult<ImgVec<RGBA8>> {
    if canvas.width() == width && canvas.height() == height {
        return Ok(ImgVec::new(canvas.pixels().collect(), width, height));
    }
    let (buf, src_width, src_height) = canvas.to_contiguous_buf();
    let mut dst = new_canvas(width, height, RGBA8::new(0, 0, 0, 0))?;
    if smooth {
        let mut r = resize::new(src_width, src_height, width, height, resize::Pixel::RGBA8P, resize::Type::Lanczos3)?;
        r.resize(&buf, dst.buf_mut())?;
    } else {
        let mut r = resize::new(src_width, src_height, width, height, resize::Pixel::RGBA8, resize::Type::Point)?;
        r.resize(&buf, dst.buf_mut())?;
    }
    Ok(dst)
}
