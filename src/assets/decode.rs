use anyhow::Context;
use base64::Engine as _;

use crate::assets::prepared::PreparedImage;
use crate::foundation::error::{DrapeError, DrapeResult};

/// Decode any raster format the `image` crate recognizes into straight-alpha RGBA8.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn decode_image(bytes: &[u8]) -> DrapeResult<PreparedImage> {
    if bytes.is_empty() {
        return Err(DrapeError::decode("image bytes are empty"));
    }
    let dyn_img = image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| DrapeError::decode(format!("{e:#}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    PreparedImage::from_rgba8(width, height, rgba.into_raw())
}

/// Decode a `data:<mime>;base64,<payload>` URI (or a bare base64 payload) into an image.
pub fn decode_data_uri(uri: &str) -> DrapeResult<PreparedImage> {
    let uri = uri.trim();
    let payload = if uri.starts_with("data:") {
        uri.find(";base64,")
            .map(|pos| &uri[pos + ";base64,".len()..])
            .ok_or_else(|| DrapeError::decode("data URI is not base64 encoded"))?
    } else {
        uri
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| DrapeError::decode(format!("invalid base64 payload: {e}")))?;
    decode_image(&bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
