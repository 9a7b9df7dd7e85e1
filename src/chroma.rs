//! Chroma-key: replaces background-colored pixels with transparency
//!
//! Runs on the fully drawn logical canvas, never on the source crop, so edges are keyed
//! at working resolution.

use crate::color::{ChromaKeySpec, FillMode};
use imgref::ImgVec;
use rgb::RGBA8;
use std::collections::VecDeque;

/// Keys out the background of `image` in place. Returns how many pixels were keyed.
pub fn key_out(image: &mut ImgVec<RGBA8>, spec: &ChromaKeySpec) -> usize {
    if image.width() == 0 || image.height() == 0 {
        return 0;
    }
    match spec.fill {
        FillMode::Global => key_global(image, spec),
        FillMode::Flood => key_flood(image, spec),
    }
}

fn key_global(image: &mut ImgVec<RGBA8>, spec: &ChromaKeySpec) -> usize {
    let keyed = spec.keyed();
    let mut count = 0;
    for row in image.rows_mut() {
        for px in row.iter_mut().filter(|px| spec.is_background(**px)) {
            *px = keyed;
            count += 1;
        }
    }
    count
}

/// Region growing from every background pixel on the border, through N/S/E/W neighbors.
/// Background enclosed by the subject (eyes, teeth, highlights) is left alone.
fn key_flood(image: &mut ImgVec<RGBA8>, spec: &ChromaKeySpec) -> usize {
    let width = image.width();
    let height = image.height();
    let mut fill = Flood {
        image,
        spec,
        keyed: spec.keyed(),
        seen: ImgVec::new(vec![false; width * height], width, height),
        queue: VecDeque::with_capacity(2 * (width + height)),
        count: 0,
    };

    for x in 0..width {
        fill.visit(x, 0);
        fill.visit(x, height - 1);
    }
    for y in 0..height {
        fill.visit(0, y);
        fill.visit(width - 1, y);
    }

    while let Some((x, y)) = fill.queue.pop_front() {
        if x > 0 {
            fill.visit(x - 1, y);
        }
        if x + 1 < width {
            fill.visit(x + 1, y);
        }
        if y > 0 {
            fill.visit(x, y - 1);
        }
        if y + 1 < height {
            fill.visit(x, y + 1);
        }
    }
    fill.count
}

struct Flood<'a> {
    image: &'a mut ImgVec<RGBA8>,
    spec: &'a ChromaKeySpec,
    keyed: RGBA8,
    seen: ImgVec<bool>,
    queue: VecDeque<(usize, usize)>,
    count: usize,
}

impl Flood<'_> {
    /// A marked pixel is never tested again, so it's safe to overwrite it right away
    #[inline]
    fn visit(&mut self, x: usize, y: usize) {
        if self.seen[(x, y)] || !self.spec.is_background(self.image[(x, y)]) {
            return;
        }
        self.seen[(x, y)] = true;
        self.image[(x, y)] = self.keyed;
        self.queue.push_back((x, y));
        self.count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::KeyOutput;
    use rgb::RGB8;

    const WHITE: RGBA8 = RGBA8::new(255, 255, 255, 255);
    const INK: RGBA8 = RGBA8::new(20, 30, 40, 255);

    /// 7×7 white, with a black ring around a white 1px hole in the middle
    fn ringed() -> ImgVec<RGBA8> {
        let mut img = ImgVec::new(vec![WHITE; 49], 7, 7);
        for y in 2..5_usize {
            for x in 2..5_usize {
                if (x, y) != (3, 3) {
                    img[(x, y)] = INK;
                }
            }
        }
        img
    }

    fn at(img: &ImgVec<RGBA8>, x: usize, y: usize) -> RGBA8 {
        img[(x, y)]
    }

    fn spec(fill: FillMode, output: KeyOutput) -> ChromaKeySpec {
        ChromaKeySpec::new(RGB8::new(255, 255, 255), 10., fill, output)
    }

    #[test]
    fn flood_keeps_enclosed_background() {
        let mut img = ringed();
        let n = key_out(&mut img, &spec(FillMode::Flood, KeyOutput::Alpha));
        assert_eq!(n, 49 - 9);
        assert_eq!(at(&img, 0, 0).a, 0);
        assert_eq!(at(&img, 1, 3).a, 0);
        assert_eq!(at(&img, 3, 3), WHITE);
        assert_eq!(at(&img, 2, 2), INK);
    }

    #[test]
    fn global_punches_through() {
        let mut img = ringed();
        let n = key_out(&mut img, &spec(FillMode::Global, KeyOutput::Alpha));
        assert_eq!(n, 49 - 8);
        assert_eq!(at(&img, 3, 3).a, 0);
        assert_eq!(at(&img, 2, 2), INK);
    }

    #[test]
    fn sentinel_output_is_opaque() {
        let mut img = ringed();
        let s = spec(FillMode::Flood, KeyOutput::Sentinel);
        key_out(&mut img, &s);
        assert_eq!(at(&img, 0, 6), RGBA8::new(s.key.r, s.key.g, s.key.b, 255));
        assert_eq!(at(&img, 3, 3), WHITE);
    }

    #[test]
    fn transparent_pixels_count_as_background() {
        let clear = RGBA8::new(1, 2, 3, 0);
        // the white pocket at (2, 1) is walled in by ink
        let mut img = ImgVec::new(vec![
            clear, WHITE, INK, INK,
            clear, INK, WHITE, INK,
            clear, INK, INK, INK,
        ], 4, 3);
        let s = spec(FillMode::Flood, KeyOutput::Sentinel);
        key_out(&mut img, &s);
        assert_eq!(at(&img, 0, 1).a, 255);
        assert_eq!(at(&img, 1, 0), at(&img, 0, 0));
        assert_eq!(at(&img, 2, 1), WHITE);

        let mut img = ImgVec::new(vec![clear, INK], 2, 1);
        assert_eq!(key_out(&mut img, &spec(FillMode::Global, KeyOutput::Alpha)), 1);
    }

    #[test]
    fn nothing_to_key() {
        let mut img = ImgVec::new(vec![INK; 16], 4, 4);
        assert_eq!(key_out(&mut img, &spec(FillMode::Flood, KeyOutput::Alpha)), 0);
        assert!(img.as_ref().pixels().all(|p| p == INK));
    }
}
