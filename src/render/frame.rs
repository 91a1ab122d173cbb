use std::io::Cursor;

use anyhow::Context;
use base64::Engine as _;

use crate::foundation::core::Canvas;
use crate::foundation::error::{DrapeError, DrapeResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;

/// Flattened canvas pixels, as produced by one render pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanvasFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub data: Vec<u8>,
}

impl CanvasFrame {
    pub(crate) fn from_premul(canvas: Canvas, data: Vec<u8>) -> DrapeResult<Self> {
        if data.len() != canvas.rgba8_len() {
            return Err(DrapeError::render(format!(
                "frame buffer has {} bytes, expected {}",
                data.len(),
                canvas.rgba8_len()
            )));
        }
        Ok(Self {
            width: canvas.width,
            height: canvas.height,
            data,
        })
    }

    /// Straight-alpha pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let mut px = [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ];
        unpremultiply_rgba8_in_place(&mut px);
        Some(px)
    }

    /// Straight-alpha copy of the pixels.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }

    /// Straight-alpha `image` buffer.
    pub fn to_rgba_image(&self) -> DrapeResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.to_rgba8())
            .ok_or_else(|| DrapeError::render("frame size does not match its buffer"))
    }

    /// PNG-encoded bytes.
    #[tracing::instrument(skip(self), fields(w = self.width, h = self.height))]
    pub fn encode_png(&self) -> DrapeResult<Vec<u8>> {
        let img = self.to_rgba_image()?;
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .context("encode frame as png")?;
        Ok(out)
    }

    /// `data:image/png;base64,...` URI of the PNG encoding.
    pub fn to_data_uri(&self) -> DrapeResult<String> {
        let png = self.encode_png()?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png)
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
