use std::sync::Arc;

use crate::foundation::error::{DrapeError, DrapeResult};
use crate::foundation::math::Fnv1a64;

/// Content-derived identity of a prepared image.
///
/// Two images with equal dimensions and pixels share an id; the rasterizer keys its paint cache by
/// it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(pub(crate) u64);

impl ImageId {
    /// Raw 64-bit value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Decoded raster image in straight-alpha RGBA8.
///
/// Pixels are shared behind an `Arc`, so clones are cheap and never copy the buffer.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    id: ImageId,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Straight-alpha RGBA8, row-major, tightly packed.
    pub rgba8: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Wrap an RGBA8 buffer, validating its length against the dimensions.
    pub fn from_rgba8(width: u32, height: u32, rgba8: Vec<u8>) -> DrapeResult<Self> {
        if width == 0 || height == 0 {
            return Err(DrapeError::validation("image width and height must be > 0"));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| DrapeError::validation("image size overflow"))?;
        if rgba8.len() != expected {
            return Err(DrapeError::validation(format!(
                "rgba8 buffer has {} bytes, expected {expected} for {width}x{height}",
                rgba8.len()
            )));
        }

        let mut h = Fnv1a64::new_default();
        h.write_u32(width);
        h.write_u32(height);
        h.write_bytes(&rgba8);

        Ok(Self {
            id: ImageId(h.finish()),
            width,
            height,
            rgba8: Arc::new(rgba8),
        })
    }

    /// Image filled with a single straight-alpha color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> DrapeResult<Self> {
        let n = (width as usize).saturating_mul(height as usize);
        Self::from_rgba8(width, height, rgba.repeat(n))
    }

    /// Content identity.
    pub fn id(&self) -> ImageId {
        self.id
    }

    /// `width / height`.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Straight-alpha pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = &self.rgba8[i..i + 4];
        Some([px[0], px[1], px[2], px[3]])
    }
}

impl PartialEq for PreparedImage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.width == other.width
            && self.height == other.height
            && (Arc::ptr_eq(&self.rgba8, &other.rgba8) || self.rgba8 == other.rgba8)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/prepared.rs"]
mod tests;
