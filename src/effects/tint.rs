//! Product color tinting.
//!
//! Every policy works per channel on straight-alpha pixels with `base` and `color` in `0..=255`
//! and the tint strength `alpha` in `[0, 1]`. The value is computed at full precision and truncated
//! toward zero exactly once, so the output never leaves `0..=255`. Alpha is passed through.
//!
//! - [`TintBlend::AlphaMultiply`]: `base*(1-alpha) + (base*color/255)*alpha`. A multiply that is
//!   blended back toward the photo, so shading survives even for colors with zero channels.
//! - [`TintBlend::Multiply`]: `base*color/255`. Full-strength multiply; `alpha` is ignored and a
//!   zero color channel crushes that channel to black.
//! - [`TintBlend::Tint`]: `base*(1-alpha) + color*alpha`. Blends toward the flat color.

use serde::{Deserialize, Serialize};

use crate::assets::color::TintColor;
use crate::assets::prepared::PreparedImage;
use crate::foundation::error::DrapeResult;

/// How a [`TintColor`] is combined with the product photo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TintBlend {
    /// Multiply blended toward the original by the tint strength.
    #[default]
    AlphaMultiply,
    /// Plain full-strength multiply.
    Multiply,
    /// Linear blend toward the tint color.
    Tint,
}

/// Tint a single RGB triple.
pub fn tint_rgb(base: [u8; 3], color: TintColor, blend: TintBlend) -> [u8; 3] {
    let a = f64::from(color.alpha.clamp(0.0, 1.0));
    let c = color.rgb.to_array();
    let mut out = [0u8; 3];
    for i in 0..3 {
        let b = f64::from(base[i]);
        let k = f64::from(c[i]);
        let v = match blend {
            TintBlend::AlphaMultiply => b * (1.0 - a) + (b * k / 255.0) * a,
            TintBlend::Multiply => b * k / 255.0,
            TintBlend::Tint => b * (1.0 - a) + k * a,
        };
        out[i] = truncate_channel(v);
    }
    out
}

/// Produce a tinted copy of `base`. The input image is never modified.
#[tracing::instrument(skip(base), fields(w = base.width, h = base.height))]
pub fn tint(
    base: &PreparedImage,
    color: TintColor,
    blend: TintBlend,
) -> DrapeResult<PreparedImage> {
    let mut out = Vec::with_capacity(base.rgba8.len());
    for px in base.rgba8.chunks_exact(4) {
        let [r, g, b] = tint_rgb([px[0], px[1], px[2]], color, blend);
        out.extend_from_slice(&[r, g, b, px[3]]);
    }
    PreparedImage::from_rgba8(base.width, base.height, out)
}

fn truncate_channel(v: f64) -> u8 {
    // Absorb representation error (e.g. 99.99999999) before truncating.
    (v + 1e-9).floor().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/effects/tint.rs"]
mod tests;
