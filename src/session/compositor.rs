use crate::assets::catalog::ProductDescriptor;
use crate::assets::color::TintColor;
use crate::assets::decode::{decode_data_uri, decode_image};
use crate::assets::prepared::PreparedImage;
use crate::design::manager::{DesignManager, DesignObject};
use crate::effects::tint::{TintBlend, tint};
use crate::foundation::core::{Canvas, PlacementRect, Point, Rect, Rgb8, Vec2};
use crate::foundation::error::DrapeResult;
use crate::geometry::mapper::{ContainerBox, map_to_canvas};
use crate::ink::recorder::{Brush, InkRecorder, RecorderState, StrokeSampling};
use crate::layers::layer::{BackgroundLayer, Layer, TintLayer};
use crate::layers::stack::LayerStack;
use crate::render::cpu::{CpuRasterizer, ensure_rasterizable};
use crate::render::frame::CanvasFrame;
use crate::session::decode::{DecodeGuard, DecodeKind, DecodeOutcome, DecodeTicket};
use crate::session::events::{InputEvent, Mode, PointerPos};

/// Options for a [`Compositor`].
#[derive(Clone, Debug)]
pub struct CompositorOpts {
    /// Canvas used until a product is loaded; afterwards the product's canvas applies.
    pub canvas: Canvas,
    /// How the tint color is combined with the product photo.
    pub tint_blend: TintBlend,
    /// Strength applied to colors given as plain RGB.
    pub tint_alpha: f32,
    /// When brush changes reach a stroke in progress.
    pub stroke_sampling: StrokeSampling,
    /// Brush at session start.
    pub brush: Brush,
    /// Fill shown while no product photo is loaded.
    pub placeholder: Rgb8,
    /// Edge of the selection handles, in canvas pixels.
    pub handle_size: f64,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            tint_blend: TintBlend::default(),
            tint_alpha: TintColor::DEFAULT_ALPHA,
            stroke_sampling: StrokeSampling::default(),
            brush: Brush::default(),
            placeholder: Rgb8::new(243, 244, 246),
            handle_size: DesignManager::DEFAULT_HANDLE_SIZE,
        }
    }
}

impl CompositorOpts {
    /// Return options with another initial canvas.
    pub fn with_canvas(mut self, canvas: Canvas) -> Self {
        self.canvas = canvas;
        self
    }

    /// Return options with another tint blend policy.
    pub fn with_tint_blend(mut self, blend: TintBlend) -> Self {
        self.tint_blend = blend;
        self
    }

    /// Return options with another tint strength.
    pub fn with_tint_alpha(mut self, alpha: f32) -> Self {
        self.tint_alpha = alpha;
        self
    }

    /// Return options with another stroke sampling policy.
    pub fn with_stroke_sampling(mut self, sampling: StrokeSampling) -> Self {
        self.stroke_sampling = sampling;
        self
    }

    /// Return options with another initial brush.
    pub fn with_brush(mut self, brush: Brush) -> Self {
        self.brush = brush;
        self
    }

    /// Return options with another placeholder fill.
    pub fn with_placeholder(mut self, placeholder: Rgb8) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Return options with another selection handle size.
    pub fn with_handle_size(mut self, size: f64) -> Self {
        self.handle_size = size;
        self
    }
}

#[derive(Clone, Debug)]
struct LoadedProduct {
    descriptor: ProductDescriptor,
    base: PreparedImage,
}

/// Session state a load rolls back to when its render pass fails.
struct Checkpoint {
    stack: LayerStack,
    recorder: InkRecorder,
    designs: DesignManager,
    mode: Mode,
    product: Option<LoadedProduct>,
}

/// Owns the layer stack and the canvas pixels of one customization session.
///
/// Every mutation rebuilds the frame from the full layer stack. Decodes of product photos and
/// uploaded designs are split into `begin_*` (issue a [`DecodeTicket`]) and `finish_*` (apply
/// the decoded bytes) so hosts can decode off the UI path; finishing a superseded ticket is a
/// no-op reported as [`DecodeOutcome::Stale`].
pub struct Compositor {
    opts: CompositorOpts,
    stack: LayerStack,
    recorder: InkRecorder,
    designs: DesignManager,
    mode: Mode,
    color: TintColor,
    product: Option<LoadedProduct>,
    pending_product: Option<(DecodeTicket, ProductDescriptor)>,
    guard: DecodeGuard,
    raster: CpuRasterizer,
    frame: CanvasFrame,
}

impl Compositor {
    /// Empty session showing the placeholder background, in draw mode.
    pub fn new(opts: CompositorOpts) -> DrapeResult<Self> {
        let mut raster = CpuRasterizer::new(opts.canvas, opts.placeholder)?;
        let stack = LayerStack::new();
        let frame = raster.render(&stack, None)?;
        Ok(Self {
            recorder: InkRecorder::new(opts.brush, opts.stroke_sampling),
            designs: DesignManager::new(opts.handle_size),
            mode: Mode::Draw,
            color: TintColor::new(Rgb8::WHITE).with_alpha(opts.tint_alpha),
            product: None,
            pending_product: None,
            guard: DecodeGuard::default(),
            stack,
            raster,
            frame,
            opts,
        })
    }

    /// Session options.
    pub fn opts(&self) -> &CompositorOpts {
        &self.opts
    }

    /// Current canvas size.
    pub fn canvas(&self) -> Canvas {
        self.raster.canvas()
    }

    /// The layer stack, for inspection.
    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    /// Active interaction mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current tint color.
    pub fn color(&self) -> TintColor {
        self.color
    }

    /// Current brush.
    pub fn brush(&self) -> Brush {
        self.recorder.brush()
    }

    /// Whether a stroke is being drawn.
    pub fn recorder_state(&self) -> RecorderState {
        self.recorder.state()
    }

    /// Descriptor of the loaded product, if any.
    pub fn product(&self) -> Option<&ProductDescriptor> {
        self.product.as_ref().map(|p| &p.descriptor)
    }

    /// The design object, if one was uploaded.
    pub fn design(&self) -> Option<&DesignObject> {
        self.stack.design()
    }

    /// Whether the design object is selected.
    pub fn is_design_selected(&self) -> bool {
        self.designs.is_selected() && self.stack.design().is_some()
    }

    /// Map a client-space pointer position inside `container` onto the canvas.
    pub fn map_pointer(&self, container: ContainerBox, client_x: f64, client_y: f64) -> Point {
        map_to_canvas(container, self.canvas(), client_x, client_y)
    }

    /// Start loading `descriptor`. Until the matching finish, the last frame stays on screen.
    pub fn begin_product_load(
        &mut self,
        descriptor: ProductDescriptor,
    ) -> DrapeResult<DecodeTicket> {
        descriptor.validate()?;
        let ticket = self.guard.issue(DecodeKind::Product);
        tracing::debug!(product = %descriptor.id, generation = ticket.generation(), "product load");
        self.pending_product = Some((ticket, descriptor));
        Ok(ticket)
    }

    /// Decode `bytes` as the photo for `ticket` and apply it.
    pub fn finish_product_load(&mut self, ticket: DecodeTicket, bytes: &[u8]) -> DecodeOutcome {
        if !self.is_pending_product(ticket) {
            return self.stale(ticket);
        }
        self.complete_product_load(ticket, decode_image(bytes))
    }

    /// Apply a product photo decoded by the host.
    #[tracing::instrument(skip(self, decoded), fields(generation = ticket.generation()))]
    pub fn complete_product_load(
        &mut self,
        ticket: DecodeTicket,
        decoded: DrapeResult<PreparedImage>,
    ) -> DecodeOutcome {
        if !self.is_pending_product(ticket) {
            return self.stale(ticket);
        }
        let Some((_, descriptor)) = self.pending_product.take() else {
            return self.stale(ticket);
        };

        let base = match decoded {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(
                    product = %descriptor.id,
                    error = %e,
                    "product photo decode failed"
                );
                return DecodeOutcome::Failed(e.to_string());
            }
        };
        match self.apply_product(descriptor, base) {
            Ok(()) => DecodeOutcome::Applied,
            Err(e) => {
                tracing::warn!(error = %e, "product could not be applied");
                DecodeOutcome::Failed(e.to_string())
            }
        }
    }

    /// Load a product synchronously.
    pub fn load_product(
        &mut self,
        descriptor: ProductDescriptor,
        bytes: &[u8],
    ) -> DrapeResult<DecodeOutcome> {
        let ticket = self.begin_product_load(descriptor)?;
        Ok(self.finish_product_load(ticket, bytes))
    }

    /// Change the tint color, keeping its strength at the configured alpha.
    pub fn set_color(&mut self, rgb: Rgb8) -> DrapeResult<()> {
        self.set_tint(TintColor::new(rgb).with_alpha(self.opts.tint_alpha))
    }

    /// Change the tint color and strength. Only the tint layer is rebuilt.
    pub fn set_tint(&mut self, color: TintColor) -> DrapeResult<()> {
        self.color = color;
        let Some(product) = &self.product else {
            return Ok(());
        };
        let tinted = tint(&product.base, color, self.opts.tint_blend)?;
        self.stack.replace_tint(TintLayer {
            image: tinted,
            color,
            blend: self.opts.tint_blend,
        });
        self.render().map(|_| ())
    }

    fn is_pending_product(&self, ticket: DecodeTicket) -> bool {
        ticket.kind() == DecodeKind::Product
            && self.guard.is_current(ticket)
            && self.pending_product.as_ref().is_some_and(|(t, _)| *t == ticket)
    }

    fn apply_product(
        &mut self,
        descriptor: ProductDescriptor,
        base: PreparedImage,
    ) -> DrapeResult<()> {
        ensure_rasterizable(&base)?;
        let tinted = tint(&base, self.color, self.opts.tint_blend)?;
        let checkpoint = self.checkpoint();
        let previous_raster = if descriptor.canvas != self.raster.canvas() {
            let raster = CpuRasterizer::new(descriptor.canvas, self.opts.placeholder)?;
            Some(std::mem::replace(&mut self.raster, raster))
        } else {
            None
        };

        self.stack.replace_product_layers(
            BackgroundLayer { image: base.clone() },
            TintLayer {
                image: tinted,
                color: self.color,
                blend: self.opts.tint_blend,
            },
        );
        let id = descriptor.id.clone();
        self.product = Some(LoadedProduct { descriptor, base });

        if let Err(e) = self.render() {
            self.rollback(checkpoint);
            if let Some(raster) = previous_raster {
                self.raster = raster;
            }
            return Err(e);
        }
        tracing::debug!(product = %id, "product layers rebuilt");
        Ok(())
    }

    /// Start a design upload, superseding any upload still in flight.
    pub fn begin_design_load(&mut self) -> DecodeTicket {
        self.guard.issue(DecodeKind::Design)
    }

    /// Decode `bytes` as the design for `ticket` and place it.
    pub fn finish_design_load(&mut self, ticket: DecodeTicket, bytes: &[u8]) -> DecodeOutcome {
        if !self.is_current_design(ticket) {
            return self.stale(ticket);
        }
        self.complete_design_load(ticket, decode_image(bytes))
    }

    /// Like [`Compositor::finish_design_load`] for a `data:` URI.
    pub fn finish_design_load_data_uri(
        &mut self,
        ticket: DecodeTicket,
        uri: &str,
    ) -> DecodeOutcome {
        if !self.is_current_design(ticket) {
            return self.stale(ticket);
        }
        self.complete_design_load(ticket, decode_data_uri(uri))
    }

    /// Place a design decoded by the host. On success the mode switches to select.
    #[tracing::instrument(skip(self, decoded), fields(generation = ticket.generation()))]
    pub fn complete_design_load(
        &mut self,
        ticket: DecodeTicket,
        decoded: DrapeResult<PreparedImage>,
    ) -> DecodeOutcome {
        if !self.is_current_design(ticket) {
            return self.stale(ticket);
        }
        let image = match decoded {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(error = %e, "design decode failed");
                return DecodeOutcome::Failed(e.to_string());
            }
        };
        // Retire the ticket so a duplicate completion cannot place the design twice.
        self.guard.issue(DecodeKind::Design);

        if let Err(e) = ensure_rasterizable(&image) {
            tracing::warn!(error = %e, "design cannot be rendered");
            return DecodeOutcome::Failed(e.to_string());
        }
        let checkpoint = self.checkpoint();
        let placement = self.placement();
        if let Err(e) = self.designs.load_design(&mut self.stack, image, placement) {
            tracing::warn!(error = %e, "design could not be placed");
            return DecodeOutcome::Failed(e.to_string());
        }
        self.enter_mode(Mode::Select);
        match self.render() {
            Ok(_) => DecodeOutcome::Applied,
            Err(e) => {
                tracing::warn!(error = %e, "design could not be rendered");
                self.rollback(checkpoint);
                DecodeOutcome::Failed(e.to_string())
            }
        }
    }

    /// Upload a design synchronously.
    pub fn load_design(&mut self, bytes: &[u8]) -> DecodeOutcome {
        let ticket = self.begin_design_load();
        self.finish_design_load(ticket, bytes)
    }

    /// Upload a design from a `data:` URI synchronously.
    pub fn load_design_data_uri(&mut self, uri: &str) -> DecodeOutcome {
        let ticket = self.begin_design_load();
        self.finish_design_load_data_uri(ticket, uri)
    }

    fn is_current_design(&self, ticket: DecodeTicket) -> bool {
        ticket.kind() == DecodeKind::Design && self.guard.is_current(ticket)
    }

    /// Placement rectangle of the loaded product, or the whole canvas.
    fn placement(&self) -> PlacementRect {
        match &self.product {
            Some(p) => p.descriptor.placement,
            None => {
                let c = self.canvas();
                PlacementRect::new(0.0, 0.0, f64::from(c.width), f64::from(c.height))
            }
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            stack: self.stack.clone(),
            recorder: self.recorder.clone(),
            designs: self.designs.clone(),
            mode: self.mode,
            product: self.product.clone(),
        }
    }

    /// Restore state captured before a load whose render pass failed. The frame was never
    /// replaced, so it still matches the restored stack.
    fn rollback(&mut self, checkpoint: Checkpoint) {
        self.stack = checkpoint.stack;
        self.recorder = checkpoint.recorder;
        self.designs = checkpoint.designs;
        self.mode = checkpoint.mode;
        self.product = checkpoint.product;
    }

    fn stale(&self, ticket: DecodeTicket) -> DecodeOutcome {
        tracing::debug!(
            kind = ?ticket.kind(),
            generation = ticket.generation(),
            "discarding stale decode"
        );
        DecodeOutcome::Stale
    }

    /// Switch the interaction mode. A stroke in progress is finished first.
    pub fn set_mode(&mut self, mode: Mode) -> DrapeResult<()> {
        if mode == self.mode {
            return Ok(());
        }
        self.enter_mode(mode);
        self.render().map(|_| ())
    }

    fn enter_mode(&mut self, mode: Mode) {
        if let Some(stroke) = self.recorder.pointer_up() {
            self.stack.add_layer(Layer::InkStroke(stroke));
        }
        self.designs.pointer_up();
        if self.mode != mode {
            tracing::debug!(from = ?self.mode, to = ?mode, "mode switch");
        }
        self.mode = mode;
    }

    /// Replace the brush.
    pub fn set_brush(&mut self, brush: Brush) {
        self.recorder.set_brush(brush);
    }

    /// Change the brush color.
    pub fn set_brush_color(&mut self, color: Rgb8) {
        self.set_brush(self.brush().with_color(color));
    }

    /// Change the brush width (rounded, clamped into 1..=20).
    pub fn set_brush_width(&mut self, width: f64) {
        self.set_brush(self.brush().with_width(width));
    }

    /// Pointer pressed at a canvas position.
    pub fn pointer_down(&mut self, pos: Point) -> DrapeResult<()> {
        match self.mode {
            Mode::Draw => {
                if self.recorder.pointer_down(pos) {
                    self.render()?;
                }
            }
            Mode::Select => {
                // Selection only shows up in the display frame; no re-render needed.
                self.designs.pointer_down(&self.stack, pos);
            }
        }
        Ok(())
    }

    /// Pointer moved to a canvas position.
    pub fn pointer_move(&mut self, pos: Point) -> DrapeResult<()> {
        let changed = match self.mode {
            Mode::Draw => self.recorder.pointer_move(pos),
            Mode::Select => self.designs.pointer_move(&mut self.stack, pos),
        };
        if changed {
            self.render()?;
        }
        Ok(())
    }

    /// Pointer released.
    pub fn pointer_up(&mut self) -> DrapeResult<()> {
        match self.mode {
            Mode::Draw => {
                if let Some(stroke) = self.recorder.pointer_up() {
                    self.stack.add_layer(Layer::InkStroke(stroke));
                    self.render()?;
                }
            }
            Mode::Select => {
                self.designs.pointer_up();
            }
        }
        Ok(())
    }

    /// Pointer left the canvas; same as releasing it.
    pub fn pointer_leave(&mut self) -> DrapeResult<()> {
        self.pointer_up()
    }

    /// Move the design object. Only honored in select mode.
    pub fn move_design_by(&mut self, delta: Vec2) -> DrapeResult<bool> {
        if self.mode != Mode::Select || !self.designs.move_by(&mut self.stack, delta) {
            return Ok(false);
        }
        self.render()?;
        Ok(true)
    }

    /// Scale the design object around its center. Only honored in select mode.
    pub fn scale_design(&mut self, scale: f64) -> DrapeResult<bool> {
        if self.mode != Mode::Select || !self.designs.scale_to(&mut self.stack, scale) {
            return Ok(false);
        }
        self.render()?;
        Ok(true)
    }

    /// Remove ink strokes (including one in progress) and the design object. The product
    /// layers stay.
    pub fn clear(&mut self) -> DrapeResult<()> {
        self.recorder.cancel();
        self.designs.reset();
        let removed = self.stack.clear_user_content();
        tracing::debug!(removed, "cleared user content");
        self.render().map(|_| ())
    }

    /// Rebuild the frame from an empty buffer and the full layer stack.
    pub fn render(&mut self) -> DrapeResult<&CanvasFrame> {
        self.frame = self.raster.render(&self.stack, self.recorder.live_runs())?;
        Ok(&self.frame)
    }

    /// Last rendered frame, without UI affordances.
    pub fn frame(&self) -> &CanvasFrame {
        &self.frame
    }

    /// Last rendered frame with selection handles drawn over a selected design in select mode.
    pub fn display_frame(&self) -> DrapeResult<CanvasFrame> {
        match self.stack.design() {
            Some(object) if self.mode == Mode::Select && self.designs.is_selected() => {
                let handles: Vec<Rect> = self
                    .designs
                    .handle_rects(object)
                    .iter()
                    .map(|(_, r)| *r)
                    .collect();
                self.raster.render_selection(&self.frame, object, &handles)
            }
            _ => Ok(self.frame.clone()),
        }
    }

    /// PNG bytes of the current frame, without selection handles.
    pub fn export_png(&self) -> DrapeResult<Vec<u8>> {
        self.frame.encode_png()
    }

    /// `data:image/png;base64,...` URI of the current frame, without selection handles.
    pub fn export_data_uri(&self) -> DrapeResult<String> {
        self.frame.to_data_uri()
    }

    /// Route one input event.
    pub fn dispatch(&mut self, event: InputEvent) -> DrapeResult<()> {
        match event {
            InputEvent::PointerDown(pos) => self.pointer_down(self.resolve(pos)),
            InputEvent::PointerMove(pos) => self.pointer_move(self.resolve(pos)),
            InputEvent::PointerUp => self.pointer_up(),
            InputEvent::PointerLeave => self.pointer_leave(),
            InputEvent::BrushColor { color } => {
                self.set_brush_color(color);
                Ok(())
            }
            InputEvent::BrushWidth { width } => {
                self.set_brush_width(width);
                Ok(())
            }
            InputEvent::TintColor { color } => self.set_color(color),
            InputEvent::SetMode { mode } => self.set_mode(mode),
            InputEvent::MoveDesign { dx, dy } => {
                self.move_design_by(Vec2::new(dx, dy)).map(|_| ())
            }
            InputEvent::ScaleDesign { scale } => self.scale_design(scale).map(|_| ()),
            InputEvent::Clear => self.clear(),
        }
    }

    fn resolve(&self, pos: PointerPos) -> Point {
        match pos.container {
            Some(container) => self.map_pointer(container, pos.x, pos.y),
            None => Point::new(pos.x, pos.y),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/compositor.rs"]
mod tests;
