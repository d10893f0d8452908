//! Colour arguments and per-pixel colour math.

use std::fmt;
use std::str::FromStr;

use palette::{Hsl, IntoColor, Srgb};

/// An RGBA colour value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Colour {
    /// Create a new colour from RGBA components.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a new opaque colour from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Parse a hex colour string.
    ///
    /// Supports formats:
    /// - `#RGB` (3 digits, expanded to 6)
    /// - `#RGBA` (4 digits, expanded to 8)
    /// - `#RRGGBB` (6 digits)
    /// - `#RRGGBBAA` (8 digits)
    pub fn from_hex(s: &str) -> Result<Self, String> {
        let s = s.trim();
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("invalid hex colour: {}", s));
        }

        let nibble = |i: usize| parse_hex(&hex[i..i + 1]).map(|n| n << 4 | n);
        let byte = |i: usize| parse_hex(&hex[i..i + 2]);

        match hex.len() {
            3 => Ok(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
            4 => Ok(Self::new(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(format!(
                "invalid hex colour: {} (use #RGB, #RGBA, #RRGGBB or #RRGGBBAA)",
                s
            )),
        }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_rgba([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }

    /// Shift HSL saturation by a percentage of the remaining range.
    pub fn saturate(self, percent: f32) -> Colour {
        let rgb: Srgb<f32> = Srgb::new(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        );
        let mut hsl: Hsl = rgb.into_color();

        let delta = percent / 100.0;
        if delta > 0.0 {
            hsl.saturation += (1.0 - hsl.saturation) * delta;
        } else {
            hsl.saturation += hsl.saturation * delta;
        }
        hsl.saturation = hsl.saturation.clamp(0.0, 1.0);

        let out: Srgb<f32> = hsl.into_color();
        Colour::new(
            (out.red * 255.0).round() as u8,
            (out.green * 255.0).round() as u8,
            (out.blue * 255.0).round() as u8,
            self.a,
        )
    }

    /// Blend toward `other` by `factor` (0.0 keeps self, 1.0 gives other).
    /// Alpha is kept from self.
    pub fn mix(self, other: Colour, factor: f32) -> Colour {
        let factor = factor.clamp(0.0, 1.0);
        let inv = 1.0 - factor;
        let blend = |a: u8, b: u8| ((a as f32 * inv) + (b as f32 * factor)).round() as u8;
        Colour::new(
            blend(self.r, other.r),
            blend(self.g, other.g),
            blend(self.b, other.b),
            self.a,
        )
    }
}

impl FromStr for Colour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

fn parse_hex(digits: &str) -> Result<u8, String> {
    u8::from_str_radix(digits, 16).map_err(|_| format!("invalid hex digits: {}", digits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_formats() {
        assert_eq!(Colour::from_hex("#F00").unwrap(), Colour::rgb(255, 0, 0));
        assert_eq!(Colour::from_hex("#F008").unwrap(), Colour::new(255, 0, 0, 136));
        assert_eq!(Colour::from_hex("00FF00").unwrap(), Colour::rgb(0, 255, 0));
        assert_eq!(
            Colour::from_hex("#0000FF80").unwrap(),
            Colour::new(0, 0, 255, 128)
        );
    }

    #[test]
    fn test_from_hex_invalid() {
        assert!(Colour::from_hex("#GG0000").is_err());
        assert!(Colour::from_hex("#12345").is_err());
        assert!(Colour::from_hex("").is_err());
        assert!(Colour::from_hex("#éé").is_err());
        assert!(Colour::from_hex("#+F+F+F").is_err());
        assert!(Colour::from_hex("#+FF").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for hex in ["#FF8000", "#00000080"] {
            let colour: Colour = hex.parse().unwrap();
            assert_eq!(colour.to_string(), hex);
        }
    }

    #[test]
    fn test_desaturate_fully_is_grey() {
        let grey = Colour::rgb(200, 100, 50).saturate(-100.0);
        assert_eq!(grey.r, grey.g);
        assert_eq!(grey.g, grey.b);
    }

    #[test]
    fn test_mix() {
        let c = Colour::BLACK.mix(Colour::WHITE, 0.5);
        assert_eq!(c, Colour::rgb(128, 128, 128));
        assert_eq!(Colour::BLACK.mix(Colour::WHITE, 2.0), Colour::WHITE);
    }
}
