use serde::{Deserialize, Serialize};

use crate::foundation::core::{Point, Rgb8};
use crate::foundation::error::{DrapeError, DrapeResult};
use crate::geometry::mapper::ContainerBox;

/// Which component pointer events are routed to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Pointer drags record ink strokes.
    #[default]
    Draw,
    /// Pointer drags move and resize the design object.
    Select,
}

/// Pointer position, either in canvas pixels or in client coordinates of a scaled container.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointerPos {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Container the canvas is displayed in. When set, `x`/`y` are client coordinates and are
    /// mapped onto the canvas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerBox>,
}

impl PointerPos {
    /// Position already in canvas pixels.
    pub fn canvas(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            container: None,
        }
    }

    /// Client position inside `container`.
    pub fn client(container: ContainerBox, x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            container: Some(container),
        }
    }
}

impl From<Point> for PointerPos {
    fn from(p: Point) -> Self {
        Self::canvas(p.x, p.y)
    }
}

/// One UI input, as fed to [`crate::Compositor::dispatch`].
///
/// Serialized with an internal `type` tag, e.g. `{"type":"pointer_down","x":10,"y":20}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Pointer pressed.
    PointerDown(PointerPos),
    /// Pointer moved.
    PointerMove(PointerPos),
    /// Pointer released.
    PointerUp,
    /// Pointer left the canvas.
    PointerLeave,
    /// Change the brush color.
    BrushColor {
        /// New color.
        color: Rgb8,
    },
    /// Change the brush width.
    BrushWidth {
        /// New width, rounded to whole pixels and clamped into 1..=20.
        width: f64,
    },
    /// Change the product tint color.
    TintColor {
        /// New color.
        color: Rgb8,
    },
    /// Switch the interaction mode.
    SetMode {
        /// Mode to switch to.
        mode: Mode,
    },
    /// Move the design object.
    MoveDesign {
        /// Horizontal offset in canvas pixels.
        dx: f64,
        /// Vertical offset in canvas pixels.
        dy: f64,
    },
    /// Scale the design object around its center.
    ScaleDesign {
        /// New uniform scale.
        scale: f64,
    },
    /// Remove ink strokes and the design object.
    Clear,
}

impl InputEvent {
    /// Parse a JSON array of events.
    pub fn list_from_reader<R: std::io::Read>(reader: R) -> DrapeResult<Vec<Self>> {
        serde_json::from_reader(reader).map_err(|e| DrapeError::serde(e.to_string()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/events.rs"]
mod tests;
