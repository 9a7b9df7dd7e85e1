//! Color parsing and the distance test shared by keying and content detection

use crate::error::*;
use rgb::{RGB8, RGBA8};

/// Euclidean distance between black and white, `sqrt(3 × 255²)`
pub const MAX_RGB_DISTANCE: f64 = 441.672_955_930_063_7;

const MAGENTA: RGB8 = RGB8::new(255, 0, 255);
const GREEN: RGB8 = RGB8::new(0, 255, 0);

/// How keyed pixels are written back
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum KeyOutput {
    /// Alpha set to 0
    #[default]
    Alpha,
    /// Opaque sentinel color, for encoders that mark transparency with one palette color
    Sentinel,
}

/// Which background pixels get keyed out
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum FillMode {
    /// Only background reachable from the frame border
    #[default]
    Flood,
    /// Every pixel close enough to the target color
    Global,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ChromaKeySpec {
    pub target: RGB8,
    /// Written in place of keyed pixels when `output` is `Sentinel`
    pub key: RGB8,
    /// Squared RGB distance at or below which a pixel is background
    pub tolerance_sq: u32,
    pub fill: FillMode,
    pub output: KeyOutput,
}

impl ChromaKeySpec {
    /// `tolerance` is 0-100, percent of `MAX_RGB_DISTANCE`
    #[must_use]
    pub fn new(target: RGB8, tolerance: f64, fill: FillMode, output: KeyOutput) -> Self {
        Self {
            target,
            key: sentinel_for(target),
            tolerance_sq: tolerance_sq(tolerance),
            fill,
            output,
        }
    }

    /// Background test: already transparent, or close to the target color
    #[inline]
    #[must_use]
    pub fn is_background(&self, px: RGBA8) -> bool {
        px.a == 0 || distance_sq(RGB8::new(px.r, px.g, px.b), self.target) <= self.tolerance_sq
    }

    #[inline]
    pub(crate) fn keyed(&self) -> RGBA8 {
        match self.output {
            KeyOutput::Alpha => RGBA8::new(self.key.r, self.key.g, self.key.b, 0),
            KeyOutput::Sentinel => RGBA8::new(self.key.r, self.key.g, self.key.b, 255),
        }
    }
}

/// Squared distance threshold for a 0-100 tolerance
#[must_use]
pub fn tolerance_sq(tolerance: f64) -> u32 {
    let dist = tolerance.clamp(0., 100.) / 100. * MAX_RGB_DISTANCE;
    (dist * dist).floor() as u32
}

#[inline(always)]
#[must_use]
pub fn distance_sq(a: RGB8, b: RGB8) -> u32 {
    let dr = i32::from(a.r) - i32::from(b.r);
    let dg = i32::from(a.g) - i32::from(b.g);
    let db = i32::from(a.b) - i32::from(b.b);
    (dr * dr + dg * dg + db * db) as u32
}

/// Magenta, unless the target is close to magenta, then green
#[must_use]
pub fn sentinel_for(target: RGB8) -> RGB8 {
    if distance_sq(target, MAGENTA) < 100 * 100 {
        GREEN
    } else {
        MAGENTA
    }
}

/// Parses `#rgb`, `#rrggbb`, with or without `#`
pub fn parse_hex_color(s: &str) -> GifResult<RGB8> {
    let hex = s.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    let digit = |c: u8| -> GifResult<u8> {
        char::from(c).to_digit(16).map(|d| d as u8)
            .ok_or_else(|| Error::InvalidColor(format!("'{s}' has a non-hex character '{}'", char::from(c))))
    };
    let b = hex.as_bytes();
    match b.len() {
        3 => {
            let r = digit(b[0])?;
            let g = digit(b[1])?;
            let b = digit(b[2])?;
            Ok(RGB8::new(r * 17, g * 17, b * 17))
        },
        6 => {
            let mut c = [0u8; 3];
            for (out, pair) in c.iter_mut().zip(b.chunks_exact(2)) {
                *out = digit(pair[0])? << 4 | digit(pair[1])?;
            }
            Ok(RGB8::new(c[0], c[1], c[2]))
        },
        _ => Err(Error::InvalidColor(format!("'{s}' isn't a #rgb or #rrggbb color"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex() {
        assert_eq!(parse_hex_color("#ff00aa").unwrap(), RGB8::new(255, 0, 170));
        assert_eq!(parse_hex_color("00FF10").unwrap(), RGB8::new(0, 255, 16));
        assert_eq!(parse_hex_color("#fff").unwrap(), RGB8::new(255, 255, 255));
        assert_eq!(parse_hex_color(" #0a0 ").unwrap(), RGB8::new(0, 170, 0));
        assert!(parse_hex_color("#ggg").is_err());
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("").is_err());
    }

    #[test]
    fn tolerance_scale() {
        assert_eq!(tolerance_sq(0.), 0);
        // 100% covers black to white
        assert!(tolerance_sq(100.) >= distance_sq(RGB8::new(0, 0, 0), RGB8::new(255, 255, 255)) - 1);
        assert_eq!(tolerance_sq(10.), 1950);
    }

    #[test]
    fn sentinel_avoids_target() {
        assert_eq!(sentinel_for(RGB8::new(255, 255, 255)), MAGENTA);
        assert_eq!(sentinel_for(RGB8::new(250, 10, 240)), GREEN);
    }

    #[test]
    fn background_test() {
        let spec = ChromaKeySpec::new(RGB8::new(255, 255, 255), 5., FillMode::Global, KeyOutput::Alpha);
        assert!(spec.is_background(RGBA8::new(250, 250, 250, 255)));
        assert!(spec.is_background(RGBA8::new(0, 0, 0, 0)));
        assert!(!spec.is_background(RGBA8::new(200, 200, 200, 255)));
    }
}
