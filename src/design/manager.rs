use crate::assets::prepared::PreparedImage;
use crate::foundation::core::{Affine, PlacementRect, Point, Rect, Size, Vec2};
use crate::foundation::error::DrapeResult;
use crate::layers::layer::{Layer, LayerKind};
use crate::layers::stack::LayerStack;

/// Position and uniform scale of a design object. `(x, y)` is the top-left corner in canvas
/// pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DesignTransform {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Uniform scale applied to the image's pixel size.
    pub scale: f64,
}

impl DesignTransform {
    /// Image space to canvas space.
    pub fn to_affine(self) -> Affine {
        Affine::translate(Vec2::new(self.x, self.y)) * Affine::scale(self.scale)
    }
}

/// The uploaded design placed on the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct DesignObject {
    /// Decoded design image.
    pub image: PreparedImage,
    /// Current placement.
    pub transform: DesignTransform,
}

impl DesignObject {
    /// Place `image` centered in `placement`, scaled to fit it with the aspect ratio preserved.
    pub fn fitted(image: PreparedImage, placement: PlacementRect) -> DrapeResult<Self> {
        placement.validate()?;
        let (w, h) = (f64::from(image.width), f64::from(image.height));
        let scale = (placement.width / w).min(placement.height / h);
        let center = placement.center();
        let transform = DesignTransform {
            x: center.x - w * scale * 0.5,
            y: center.y - h * scale * 0.5,
            scale,
        };
        Ok(Self { image, transform })
    }

    /// Displayed size in canvas pixels.
    pub fn size(&self) -> Size {
        Size::new(
            f64::from(self.image.width) * self.transform.scale,
            f64::from(self.image.height) * self.transform.scale,
        )
    }

    /// Displayed bounds in canvas pixels.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(Point::new(self.transform.x, self.transform.y), self.size())
    }
}

/// Corner resize handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handle {
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    TopRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom-right corner.
    BottomRight,
}

impl Handle {
    /// Every handle, in hit-test order.
    pub const ALL: [Handle; 4] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomLeft,
        Handle::BottomRight,
    ];

    /// Position of this corner on `r`.
    pub fn corner(self, r: Rect) -> Point {
        match self {
            Handle::TopLeft => Point::new(r.x0, r.y0),
            Handle::TopRight => Point::new(r.x1, r.y0),
            Handle::BottomLeft => Point::new(r.x0, r.y1),
            Handle::BottomRight => Point::new(r.x1, r.y1),
        }
    }

    /// Diagonally opposite handle.
    pub fn opposite(self) -> Handle {
        match self {
            Handle::TopLeft => Handle::BottomRight,
            Handle::TopRight => Handle::BottomLeft,
            Handle::BottomLeft => Handle::TopRight,
            Handle::BottomRight => Handle::TopLeft,
        }
    }

    fn is_left(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::BottomLeft)
    }

    fn is_top(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::TopRight)
    }
}

/// What a select-mode pointer-down grabbed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragTarget {
    /// The design body: dragging moves it.
    Body,
    /// A corner handle: dragging scales around the opposite corner.
    Corner(Handle),
}

#[derive(Clone, Copy, Debug)]
struct Drag {
    target: DragTarget,
    start: Point,
    origin: DesignTransform,
}

/// Owns selection and drag state for the single design object in a [`LayerStack`].
#[derive(Clone, Debug)]
pub struct DesignManager {
    selected: bool,
    drag: Option<Drag>,
    handle_size: f64,
}

impl Default for DesignManager {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HANDLE_SIZE)
    }
}

impl DesignManager {
    /// Edge of a square corner handle, in canvas pixels.
    pub const DEFAULT_HANDLE_SIZE: f64 = 10.0;
    /// Resizing never shrinks the shorter edge below this many canvas pixels.
    pub const MIN_EDGE: f64 = 4.0;

    /// Manager with square handles of `handle_size` pixels.
    pub fn new(handle_size: f64) -> Self {
        Self {
            selected: false,
            drag: None,
            handle_size: if handle_size.is_finite() && handle_size > 0.0 {
                handle_size
            } else {
                Self::DEFAULT_HANDLE_SIZE
            },
        }
    }

    /// Whether the design object is selected.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Whether a move or resize drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Handle edge length.
    pub fn handle_size(&self) -> f64 {
        self.handle_size
    }

    /// Place `image` in `placement`, replace any existing design object and select the new one.
    pub fn load_design(
        &mut self,
        stack: &mut LayerStack,
        image: PreparedImage,
        placement: PlacementRect,
    ) -> DrapeResult<DesignObject> {
        let object = DesignObject::fitted(image, placement)?;
        stack.replace_singleton(LayerKind::DesignObject, Layer::DesignObject(object.clone()));
        self.selected = true;
        self.drag = None;
        tracing::debug!(
            w = object.image.width,
            h = object.image.height,
            scale = object.transform.scale,
            "design placed"
        );
        Ok(object)
    }

    /// Drop selection and any drag, e.g. after the design object was removed.
    pub fn reset(&mut self) {
        self.selected = false;
        self.drag = None;
    }

    /// Handle squares centered on the corners of `object`.
    pub fn handle_rects(&self, object: &DesignObject) -> [(Handle, Rect); 4] {
        let b = object.bounds();
        let half = self.handle_size * 0.5;
        Handle::ALL.map(|h| {
            let c = h.corner(b);
            (h, Rect::new(c.x - half, c.y - half, c.x + half, c.y + half))
        })
    }

    /// Corner handles (only while selected) first, then the body.
    pub fn hit_test(&self, object: &DesignObject, pos: Point) -> Option<DragTarget> {
        if self.selected {
            for (handle, r) in self.handle_rects(object) {
                if r.contains(pos) {
                    return Some(DragTarget::Corner(handle));
                }
            }
        }
        object.bounds().contains(pos).then_some(DragTarget::Body)
    }

    /// Select and start dragging whatever is under `pos`; a miss deselects.
    pub fn pointer_down(&mut self, stack: &LayerStack, pos: Point) -> Option<DragTarget> {
        let Some(object) = stack.design() else {
            self.reset();
            return None;
        };
        let Some(target) = self.hit_test(object, pos) else {
            self.reset();
            return None;
        };
        self.selected = true;
        self.drag = Some(Drag {
            target,
            start: pos,
            origin: object.transform,
        });
        Some(target)
    }

    /// Continue a drag. Returns `true` when the design object changed.
    pub fn pointer_move(&mut self, stack: &mut LayerStack, pos: Point) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        let Some(object) = stack.design_mut() else {
            self.drag = None;
            return false;
        };

        let next = match drag.target {
            DragTarget::Body => {
                let d = pos - drag.start;
                DesignTransform {
                    x: drag.origin.x + d.x,
                    y: drag.origin.y + d.y,
                    scale: drag.origin.scale,
                }
            }
            DragTarget::Corner(handle) => resize_from_corner(object, drag.origin, handle, pos),
        };
        if next == object.transform {
            return false;
        }
        object.transform = next;
        true
    }

    /// End the drag. The selection stays.
    pub fn pointer_up(&mut self) -> bool {
        self.drag.take().is_some()
    }

    /// Translate the design object by `delta`. No-op without a design object.
    pub fn move_by(&mut self, stack: &mut LayerStack, delta: Vec2) -> bool {
        let Some(object) = stack.design_mut() else {
            return false;
        };
        if !(delta.x.is_finite() && delta.y.is_finite()) {
            return false;
        }
        object.transform.x += delta.x;
        object.transform.y += delta.y;
        true
    }

    /// Set the scale, keeping the object's center in place. No-op without a design object.
    pub fn scale_to(&mut self, stack: &mut LayerStack, scale: f64) -> bool {
        let Some(object) = stack.design_mut() else {
            return false;
        };
        if !(scale.is_finite() && scale > 0.0) {
            return false;
        }
        let scale = scale.max(min_scale(&object.image));
        let center = object.bounds().center();
        let (w, h) = (f64::from(object.image.width), f64::from(object.image.height));
        object.transform = DesignTransform {
            x: center.x - w * scale * 0.5,
            y: center.y - h * scale * 0.5,
            scale,
        };
        true
    }
}

fn min_scale(image: &PreparedImage) -> f64 {
    DesignManager::MIN_EDGE / f64::from(image.width.min(image.height))
}

/// Uniform scale that keeps the corner opposite `handle` fixed and follows `pos`.
fn resize_from_corner(
    object: &DesignObject,
    origin: DesignTransform,
    handle: Handle,
    pos: Point,
) -> DesignTransform {
    let (w, h) = (f64::from(object.image.width), f64::from(object.image.height));
    let start = Rect::from_origin_size(
        Point::new(origin.x, origin.y),
        Size::new(w * origin.scale, h * origin.scale),
    );
    let anchor = handle.opposite().corner(start);

    let sx = (pos.x - anchor.x).abs() / w;
    let sy = (pos.y - anchor.y).abs() / h;
    let scale = sx.max(sy).max(min_scale(&object.image));

    let x = if handle.is_left() {
        anchor.x - w * scale
    } else {
        anchor.x
    };
    let y = if handle.is_top() {
        anchor.y - h * scale
    } else {
        anchor.y
    };
    DesignTransform { x, y, scale }
}

#[cfg(test)]
#[path = "../../tests/unit/design/manager.rs"]
mod tests;
