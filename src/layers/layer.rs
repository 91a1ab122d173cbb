use crate::assets::color::TintColor;
use crate::assets::prepared::PreparedImage;
use crate::design::manager::DesignObject;
use crate::effects::tint::TintBlend;
use crate::ink::recorder::InkStroke;

/// Layer discriminant. The declaration order is the fixed z-order, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerKind {
    /// Product photo.
    Background,
    /// Tinted product photo.
    Tint,
    /// One finished freehand stroke.
    InkStroke,
    /// The uploaded design.
    DesignObject,
}

impl LayerKind {
    /// Kinds that may appear at most once in a stack.
    pub fn is_singleton(self) -> bool {
        !matches!(self, LayerKind::InkStroke)
    }
}

/// Product photo, stretched over the whole canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundLayer {
    /// Decoded product photo.
    pub image: PreparedImage,
}

/// Tinted copy of the product photo, stretched over the whole canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct TintLayer {
    /// Output of the tint filter.
    pub image: PreparedImage,
    /// Color the image was tinted with.
    pub color: TintColor,
    /// Policy the image was tinted with.
    pub blend: TintBlend,
}

/// One renderable entry of a [`crate::LayerStack`].
#[derive(Clone, Debug, PartialEq)]
pub enum Layer {
    /// Product photo.
    Background(BackgroundLayer),
    /// Tinted product photo.
    Tint(TintLayer),
    /// Finished freehand stroke.
    InkStroke(InkStroke),
    /// Uploaded design.
    DesignObject(DesignObject),
}

impl Layer {
    /// Discriminant of this layer.
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Background(_) => LayerKind::Background,
            Layer::Tint(_) => LayerKind::Tint,
            Layer::InkStroke(_) => LayerKind::InkStroke,
            Layer::DesignObject(_) => LayerKind::DesignObject,
        }
    }
}
