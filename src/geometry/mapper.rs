use crate::foundation::core::{Canvas, Point};

/// Bounding box of the element the canvas is displayed in, in client (viewport) coordinates.
///
/// The displayed size may differ from the canvas' intrinsic pixel size; the host is free to scale
/// the canvas responsively.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ContainerBox {
    /// Left edge in client coordinates.
    pub left: f64,
    /// Top edge in client coordinates.
    pub top: f64,
    /// Displayed width.
    pub width: f64,
    /// Displayed height.
    pub height: f64,
}

impl ContainerBox {
    /// Create a container box.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Container showing `canvas` at exactly its intrinsic size, anchored at the origin.
    pub fn native(canvas: Canvas) -> Self {
        Self::new(0.0, 0.0, f64::from(canvas.width), f64::from(canvas.height))
    }
}

/// Map a pointer position in client coordinates into canvas pixel space.
///
/// Both axes are scaled independently by `canvas / container`. A degenerate (zero, negative or
/// non-finite) container extent falls back to a scale of 1 on that axis so the mapping never
/// fails. Results are not clamped; see [`clamp_to_canvas`].
pub fn map_to_canvas(
    container: ContainerBox,
    canvas: Canvas,
    client_x: f64,
    client_y: f64,
) -> Point {
    let sx = axis_scale(f64::from(canvas.width), container.width);
    let sy = axis_scale(f64::from(canvas.height), container.height);
    Point::new(
        (client_x - container.left) * sx,
        (client_y - container.top) * sy,
    )
}

/// Clamp a canvas-space point onto the canvas bounds.
pub fn clamp_to_canvas(p: Point, canvas: Canvas) -> Point {
    let r = canvas.rect();
    Point::new(p.x.clamp(r.x0, r.x1), p.y.clamp(r.y0, r.y1))
}

fn axis_scale(canvas_len: f64, container_len: f64) -> f64 {
    if container_len.is_finite() && container_len > 0.0 {
        canvas_len / container_len
    } else {
        1.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/mapper.rs"]
mod tests;
