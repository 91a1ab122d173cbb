use crate::foundation::error::{DrapeError, DrapeResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Size, Vec2};

/// Canvas pixel dimensions.
///
/// This is the intrinsic resolution of the compositing buffer, independent of the size the host
/// displays it at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Largest edge the CPU rasterizer can address.
    pub const MAX_EDGE: u32 = u16::MAX as u32;

    /// Create a validated canvas with non-zero edges no larger than [`Canvas::MAX_EDGE`].
    pub fn new(width: u32, height: u32) -> DrapeResult<Self> {
        let c = Self { width, height };
        c.validate()?;
        Ok(c)
    }

    /// Check an already constructed (e.g. deserialized) canvas.
    pub fn validate(self) -> DrapeResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(DrapeError::validation("canvas width and height must be > 0"));
        }
        if self.width > Self::MAX_EDGE || self.height > Self::MAX_EDGE {
            return Err(DrapeError::validation(format!(
                "canvas edges must be <= {}",
                Self::MAX_EDGE
            )));
        }
        Ok(())
    }

    /// Canvas bounds as a rectangle anchored at the origin.
    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Number of bytes in a tightly packed RGBA8 buffer of this size.
    pub fn rgba8_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 600,
            height: 800,
        }
    }
}

/// Region of the canvas where user content is initially placed.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlacementRect {
    /// Left edge in canvas pixels.
    pub x: f64,
    /// Top edge in canvas pixels.
    pub y: f64,
    /// Width in canvas pixels.
    pub width: f64,
    /// Height in canvas pixels.
    pub height: f64,
}

impl PlacementRect {
    /// Create a placement rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Reject non-finite or non-positive extents.
    pub fn validate(self) -> DrapeResult<()> {
        let all_finite = [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(DrapeError::validation("placement rect must be finite"));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(DrapeError::validation(
                "placement rect width and height must be > 0",
            ));
        }
        Ok(())
    }

    /// Convert to a kurbo rectangle.
    pub fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Center point.
    pub fn center(self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }
}

/// Opaque 8-bit sRGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// Pure black.
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// Pure white.
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Construct from channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels as an array.
    pub const fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Opaque RGBA8 (straight alpha, which equals premultiplied when opaque).
    pub const fn to_rgba8(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
