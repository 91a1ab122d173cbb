use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use vello_cpu::kurbo::Shape as _;

use crate::assets::prepared::{ImageId, PreparedImage};
use crate::design::manager::DesignObject;
use crate::effects::composite::over_in_place;
use crate::foundation::core::{Affine, Canvas, Point, Rect, Rgb8};
use crate::foundation::error::{DrapeError, DrapeResult};
use crate::foundation::math::premultiply_rgba8_in_place;
use crate::ink::recorder::StrokeRun;
use crate::layers::layer::Layer;
use crate::layers::stack::LayerStack;
use crate::render::frame::CanvasFrame;

/// Environment variable bounding the number of cached image paints.
pub const PAINT_CACHE_CAPACITY_ENV: &str = "DRAPE_PAINT_CACHE_CAPACITY";
const DEFAULT_PAINT_CACHE_CAPACITY: usize = 8;

const SELECTION_OUTLINE: Rgb8 = Rgb8::new(0, 120, 215);
const HANDLE_FILL: Rgb8 = Rgb8::WHITE;

/// CPU rasterizer for a [`LayerStack`].
///
/// Every pass starts from a fresh pixmap; nothing carries over between frames except decoded
/// image paints, which are cached by content id.
pub(crate) struct CpuRasterizer {
    canvas: Canvas,
    width: u16,
    height: u16,
    placeholder: Rgb8,
    paint_cache: HashMap<ImageId, vello_cpu::Image>,
    lru: VecDeque<ImageId>,
    capacity: usize,
}

impl CpuRasterizer {
    pub(crate) fn new(canvas: Canvas, placeholder: Rgb8) -> DrapeResult<Self> {
        let capacity = std::env::var(PAINT_CACHE_CAPACITY_ENV)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_PAINT_CACHE_CAPACITY);
        Self::with_capacity(canvas, placeholder, capacity)
    }

    pub(crate) fn with_capacity(
        canvas: Canvas,
        placeholder: Rgb8,
        capacity: usize,
    ) -> DrapeResult<Self> {
        canvas.validate()?;
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| DrapeError::render("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| DrapeError::render("canvas height exceeds u16"))?;
        Ok(Self {
            canvas,
            width,
            height,
            placeholder,
            paint_cache: HashMap::new(),
            lru: VecDeque::new(),
            capacity: capacity.max(1),
        })
    }

    pub(crate) fn canvas(&self) -> Canvas {
        self.canvas
    }

    #[cfg(test)]
    pub(crate) fn cached_paints(&self) -> usize {
        self.paint_cache.len()
    }

    /// Draw every layer lowest-first. `live` is the stroke being drawn; it goes above the
    /// finished strokes and below the design object.
    #[tracing::instrument(skip_all, fields(layers = stack.len(), live = live.is_some()))]
    pub(crate) fn render(
        &mut self,
        stack: &LayerStack,
        live: Option<&[StrokeRun]>,
    ) -> DrapeResult<CanvasFrame> {
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        let mut live = live;

        if stack.background().is_none() {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(color_to_cpu(self.placeholder));
            ctx.fill_rect(&rect_to_cpu(self.canvas.rect()));
        }

        for layer in stack.render_order() {
            match layer {
                // Painted even where an opaque tint covers it; every layer is drawn in order.
                Layer::Background(b) => self.draw_stretched(&mut ctx, &b.image)?,
                Layer::Tint(t) => self.draw_stretched(&mut ctx, &t.image)?,
                Layer::InkStroke(s) => draw_runs(&mut ctx, s.runs()),
                Layer::DesignObject(d) => {
                    if let Some(runs) = live.take() {
                        draw_runs(&mut ctx, runs);
                    }
                    self.draw_design(&mut ctx, d)?;
                }
            }
        }
        if let Some(runs) = live {
            draw_runs(&mut ctx, runs);
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        CanvasFrame::from_premul(self.canvas, pixmap.data_as_u8_slice().to_vec())
    }

    /// `frame` with the selection outline and corner handles of `object` on top.
    pub(crate) fn render_selection(
        &self,
        frame: &CanvasFrame,
        object: &DesignObject,
        handles: &[Rect],
    ) -> DrapeResult<CanvasFrame> {
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        let mut overlay = vello_cpu::Pixmap::new(self.width, self.height);

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(1.0));
        ctx.set_paint(color_to_cpu(SELECTION_OUTLINE));
        ctx.stroke_path(&rect_to_cpu(object.bounds()).to_path(0.1));

        for r in handles {
            let r = rect_to_cpu(*r);
            ctx.set_paint(color_to_cpu(HANDLE_FILL));
            ctx.fill_rect(&r);
            ctx.set_paint(color_to_cpu(SELECTION_OUTLINE));
            ctx.stroke_path(&r.to_path(0.1));
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut overlay);

        let mut out = frame.clone();
        over_in_place(&mut out.data, overlay.data_as_u8_slice(), 1.0)?;
        Ok(out)
    }

    /// Product photos cover the whole canvas regardless of their own size.
    fn draw_stretched(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        image: &PreparedImage,
    ) -> DrapeResult<()> {
        let sx = f64::from(self.canvas.width) / f64::from(image.width);
        let sy = f64::from(self.canvas.height) / f64::from(image.height);
        self.draw_image(ctx, image, Affine::scale_non_uniform(sx, sy))
    }

    fn draw_design(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        object: &DesignObject,
    ) -> DrapeResult<()> {
        self.draw_image(ctx, &object.image, object.transform.to_affine())
    }

    fn draw_image(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        image: &PreparedImage,
        transform: Affine,
    ) -> DrapeResult<()> {
        let paint = self.image_paint_for(image)?;
        ctx.set_transform(affine_to_cpu(transform));
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(image.width),
            f64::from(image.height),
        ));
        Ok(())
    }

    fn image_paint_for(&mut self, image: &PreparedImage) -> DrapeResult<vello_cpu::Image> {
        let id = image.id();
        if let Some(paint) = self.paint_cache.get(&id).cloned() {
            self.touch(id);
            return Ok(paint);
        }

        let pixmap = image_to_pixmap(image)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.paint_cache.insert(id, paint.clone());
        self.touch(id);
        while self.lru.len() > self.capacity {
            if let Some(old) = self.lru.pop_front() {
                self.paint_cache.remove(&old);
            }
        }
        Ok(paint)
    }

    fn touch(&mut self, id: ImageId) {
        if let Some(pos) = self.lru.iter().position(|x| *x == id) {
            self.lru.remove(pos);
        }
        self.lru.push_back(id);
    }
}

/// Round-capped polylines; a run with a single point becomes a dot of the brush width.
fn draw_runs(ctx: &mut vello_cpu::RenderContext, runs: &[StrokeRun]) {
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    for run in runs {
        let Some((&first, rest)) = run.points.split_first() else {
            continue;
        };
        ctx.set_paint(color_to_cpu(run.brush.color));

        if rest.is_empty() {
            let dot = vello_cpu::kurbo::Circle::new(point_to_cpu(first), run.brush.width() * 0.5);
            ctx.fill_path(&dot.to_path(0.1));
            continue;
        }

        let mut path = vello_cpu::kurbo::BezPath::new();
        path.move_to(point_to_cpu(first));
        for &p in rest {
            path.line_to(point_to_cpu(p));
        }
        ctx.set_stroke(
            vello_cpu::kurbo::Stroke::new(run.brush.width())
                .with_caps(vello_cpu::kurbo::Cap::Round)
                .with_join(vello_cpu::kurbo::Join::Round),
        );
        ctx.stroke_path(&path);
    }
}

fn color_to_cpu(c: Rgb8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, 255)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

/// Reject images the pixmap backend cannot address, before they reach a layer.
pub(crate) fn ensure_rasterizable(image: &PreparedImage) -> DrapeResult<()> {
    if image.width > Canvas::MAX_EDGE || image.height > Canvas::MAX_EDGE {
        return Err(DrapeError::validation(format!(
            "image is {}x{}; edges must be <= {}",
            image.width,
            image.height,
            Canvas::MAX_EDGE
        )));
    }
    Ok(())
}

/// Straight-alpha image to a premultiplied pixmap.
fn image_to_pixmap(image: &PreparedImage) -> DrapeResult<vello_cpu::Pixmap> {
    let w: u16 = image
        .width
        .try_into()
        .map_err(|_| DrapeError::render("image width exceeds u16"))?;
    let h: u16 = image
        .height
        .try_into()
        .map_err(|_| DrapeError::render("image height exceeds u16"))?;

    let mut premul = image.rgba8.as_ref().clone();
    premultiply_rgba8_in_place(&mut premul);

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(image.width as usize * image.height as usize);
    for px in premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
