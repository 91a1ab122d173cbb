use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgb8;
use crate::foundation::error::{DrapeError, DrapeResult};

/// Product tint: an RGB color plus the strength it is blended with.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TintColor {
    /// Tint color.
    pub rgb: Rgb8,
    /// Blend strength in `[0, 1]`.
    #[serde(default = "default_tint_alpha")]
    pub alpha: f32,
}

fn default_tint_alpha() -> f32 {
    TintColor::DEFAULT_ALPHA
}

impl TintColor {
    /// Blend strength used by the product designer.
    pub const DEFAULT_ALPHA: f32 = 0.5;

    /// Tint with the default strength.
    pub fn new(rgb: Rgb8) -> Self {
        Self {
            rgb,
            alpha: Self::DEFAULT_ALPHA,
        }
    }

    /// Parse a hex color (see [`Rgb8::from_hex`]) with the default strength.
    pub fn from_hex(s: &str) -> DrapeResult<Self> {
        Ok(Self::new(Rgb8::from_hex(s)?))
    }

    /// Override the strength, clamped into `[0, 1]`. Non-finite values fall back to the default.
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = if alpha.is_finite() {
            alpha.clamp(0.0, 1.0)
        } else {
            Self::DEFAULT_ALPHA
        };
        self
    }
}

impl Default for TintColor {
    fn default() -> Self {
        Self::new(Rgb8::WHITE)
    }
}

impl Rgb8 {
    /// Parse `#RRGGBB`, `RRGGBB`, `#RGB` or `RGB` (case-insensitive).
    pub fn from_hex(s: &str) -> DrapeResult<Self> {
        parse_hex(s).map_err(DrapeError::validation)
    }

    /// Format as lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb8 {
    type Err = DrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Rgb8 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Arr([u8; 3]),
            Obj { r: u8, g: u8, b: u8 },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => parse_hex(&s).map_err(serde::de::Error::custom),
            Repr::Arr([r, g, b]) | Repr::Obj { r, g, b } => Ok(Rgb8::new(r, g, b)),
        }
    }
}

fn parse_hex(s: &str) -> Result<Rgb8, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !s.is_ascii() {
        return Err(format!("invalid hex color \"{s}\""));
    }

    match s.len() {
        6 => Ok(Rgb8::new(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
        )),
        3 => {
            let nibble = |i: usize| -> Result<u8, String> {
                let v = hex_byte(&s[i..i + 1])?;
                Ok(v * 17)
            };
            Ok(Rgb8::new(nibble(0)?, nibble(1)?, nibble(2)?))
        }
        _ => Err("hex color must be #RRGGBB or #RGB (case-insensitive)".to_owned()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/color.rs"]
mod tests;
