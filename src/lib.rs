//! Drape composes apparel previews on a fixed-resolution canvas.
//!
//! A [`Compositor`] owns one customization session:
//!
//! - load a product photo described by a [`ProductDescriptor`] and tint it with a [`TintColor`]
//! - draw freehand ink strokes in [`Mode::Draw`]
//! - upload a design and move or resize it in [`Mode::Select`]
//! - export the flattened [`CanvasFrame`] as PNG bytes or a data URI
//!
//! Rendering is CPU-only and rebuilds the whole frame from the [`LayerStack`] after every change.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod assets;
pub(crate) mod design;
pub(crate) mod effects;
pub(crate) mod geometry;
pub(crate) mod ink;
pub(crate) mod layers;
pub(crate) mod render;
pub(crate) mod session;

pub use crate::foundation::core::{
    Affine, BezPath, Canvas, PlacementRect, Point, Rect, Rgb8, Size, Vec2,
};
pub use crate::foundation::error::{DrapeError, DrapeResult};

pub use crate::assets::catalog::{Catalog, ProductCategory, ProductDescriptor, normalize_rel_path};
pub use crate::assets::color::TintColor;
pub use crate::assets::decode::{decode_data_uri, decode_image};
pub use crate::assets::prepared::{ImageId, PreparedImage};
pub use crate::design::manager::{
    DesignManager, DesignObject, DesignTransform, DragTarget, Handle,
};
pub use crate::effects::tint::{TintBlend, tint, tint_rgb};
pub use crate::geometry::mapper::{ContainerBox, clamp_to_canvas, map_to_canvas};
pub use crate::ink::recorder::{
    Brush, InkRecorder, InkStroke, RecorderState, StrokeRun, StrokeSampling,
};
pub use crate::layers::layer::{BackgroundLayer, Layer, LayerKind, TintLayer};
pub use crate::layers::stack::LayerStack;
pub use crate::render::cpu::PAINT_CACHE_CAPACITY_ENV;
pub use crate::render::frame::CanvasFrame;
pub use crate::session::compositor::{Compositor, CompositorOpts};
pub use crate::session::decode::{DecodeKind, DecodeOutcome, DecodeTicket};
pub use crate::session::events::{InputEvent, Mode, PointerPos};
