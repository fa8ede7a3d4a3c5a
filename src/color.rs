// src/color.rs
//! sRGB color used for path fills and material base colors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses a CSS color: `#rrggbb`, `#rgb`, `rgb(...)` or a named color.
    /// A bare hex string without `#` is accepted too. Alpha is dropped.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let color = s
            .parse::<svgtypes::Color>()
            .or_else(|_| format!("#{s}").parse::<svgtypes::Color>())
            .ok()?;
        Some(Self::new(color.red, color.green, color.blue))
    }

    /// Normalized `[r, g, b]` in 0..=1 (still sRGB-encoded).
    #[inline]
    pub fn to_f32(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    pub fn from_f32(rgb: [f32; 3]) -> Self {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(q(rgb[0]), q(rgb[1]), q(rgb[2]))
    }

    /// Linear interpolation per channel; `t = 0` yields `self`.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let a = self.to_f32();
        let b = other.to_f32();
        let t = t.clamp(0.0, 1.0);
        Rgb::from_f32([
            a[0] + (b[0] - a[0]) * t,
            a[1] + (b[1] - a[1]) * t,
            a[2] + (b[2] - a[2]) * t,
        ])
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::BLACK
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Rgb::parse("#ff0000"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(Rgb::parse("0F0"), Some(Rgb::new(0, 255, 0)));
        assert_eq!(Rgb::parse("#12345"), None);
        assert_eq!(Rgb::parse("#gg0000"), None);
        assert_eq!(Rgb::new(1, 2, 255).to_string(), "#0102ff");
    }

    #[test]
    fn test_named_and_functional_colors() {
        assert_eq!(Rgb::parse("red"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(Rgb::parse(" rebeccapurple "), Some(Rgb::new(102, 51, 153)));
        assert_eq!(Rgb::parse("rgb(0, 128, 255)"), Some(Rgb::new(0, 128, 255)));
        assert_eq!(Rgb::parse("not-a-color"), None);
    }

    #[test]
    fn test_lerp_endpoints() {
        let red = Rgb::new(255, 0, 0);
        assert_eq!(red.lerp(Rgb::WHITE, 0.0), red);
        assert_eq!(red.lerp(Rgb::WHITE, 1.0), Rgb::WHITE);
        assert_eq!(red.lerp(Rgb::WHITE, 0.5), Rgb::new(255, 128, 128));
    }
}
