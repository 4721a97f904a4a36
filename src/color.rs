/*!
 # Colors

 The color value pushed to the output: three 8-bit channels plus a
 brightness scalar in `0.0..=1.0`.
*/

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An RGB color with brightness
///
/// Brightness is validated on construction, so a `Color` is never NaN and
/// never out of range. Channels are range-checked by their type, or by
/// [`Color::from_components`] when they come from untrusted input.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(try_from = "ColorRecord", into = "ColorRecord")]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    brightness: f32,
}

impl Color {
    /// Creates a color, rejecting a brightness outside `0.0..=1.0`
    pub fn new(r: u8, g: u8, b: u8, brightness: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&brightness) {
            return Err(Error::BrightnessOutOfRange(brightness));
        }

        Ok(Self {
            r,
            g,
            b,
            // Folds -0.0 into 0.0 so equal colors hash equally
            brightness: brightness + 0.0,
        })
    }

    /// Creates a color from wide integer channels, rejecting anything
    /// outside `0..=255`
    pub fn from_components(r: i64, g: i64, b: i64, brightness: f32) -> Result<Self> {
        let channel = |value: i64| {
            u8::try_from(value).map_err(|_| Error::ValueOutOfRange(value, 0, 255))
        };
        Self::new(channel(r)?, channel(g)?, channel(b)?, brightness)
    }

    /// Parses a `#rrggbb` hex triplet (the `#` is optional)
    pub fn from_hex(hex: &str, brightness: f32) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(hex.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| Error::InvalidColor(hex.to_string()))
        };
        Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?, brightness)
    }

    pub fn r(&self) -> u8 {
        self.r
    }

    pub fn g(&self) -> u8 {
        self.g
    }

    pub fn b(&self) -> u8 {
        self.b
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    /// Linearly interpolates from `c1` to `c2`
    ///
    /// `t` is clamped into `0.0..=1.0`. Channels are rounded to the nearest
    /// integer (halves away from zero); brightness is not rounded.
    pub fn gradient(c1: &Color, c2: &Color, t: f32) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let lerp = |a: f32, b: f32| a + (b - a) * t;
        let channel = |a: u8, b: u8| lerp(a as f32, b as f32).round().clamp(0.0, 255.0) as u8;

        Color {
            r: channel(c1.r, c2.r),
            g: channel(c1.g, c2.g),
            b: channel(c1.b, c2.b),
            brightness: lerp(c1.brightness, c2.brightness).clamp(0.0, 1.0) + 0.0,
        }
    }
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        self.r == other.r
            && self.g == other.g
            && self.b == other.b
            && self.brightness.to_bits() == other.brightness.to_bits()
    }
}

// Brightness is never NaN, so bitwise equality is reflexive
impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.r.hash(state);
        self.g.hash(state);
        self.b.hash(state);
        self.brightness.to_bits().hash(state);
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}@{}",
            self.r, self.g, self.b, self.brightness
        )
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Parses `#rrggbb` or `#rrggbb@<brightness>`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.split_once('@') {
            Some((hex, brightness)) => {
                let brightness: f32 = brightness
                    .trim()
                    .parse()
                    .map_err(|_| Error::InvalidColor(s.to_string()))?;
                Self::from_hex(hex, brightness)
            }
            None => Self::from_hex(s, 0.0),
        }
    }
}

/// Wire shape of a color; channels are wide so out-of-range input is
/// reported instead of failing to deserialize as a type error
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
struct ColorRecord {
    r: i64,
    g: i64,
    b: i64,
    brightness: f32,
}

impl TryFrom<ColorRecord> for Color {
    type Error = Error;

    fn try_from(record: ColorRecord) -> Result<Self> {
        Color::from_components(record.r, record.g, record.b, record.brightness)
    }
}

impl From<Color> for ColorRecord {
    fn from(color: Color) -> Self {
        Self {
            r: color.r as i64,
            g: color.g as i64,
            b: color.b as i64,
            brightness: color.brightness,
        }
    }
}
