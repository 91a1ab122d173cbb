use crate::design::manager::DesignObject;
use crate::ink::recorder::InkStroke;
use crate::layers::layer::{BackgroundLayer, Layer, LayerKind, TintLayer};

#[derive(Clone, Debug, PartialEq)]
struct Entry {
    seq: u64,
    layer: Layer,
}

/// Ordered collection of layers.
///
/// Rendering order is derived from [`LayerKind`], never from insertion order: background, tint,
/// ink strokes (in the order they were added), design object. Background, tint and design object
/// are singletons.
#[derive(Clone, Debug, Default)]
pub struct LayerStack {
    entries: Vec<Entry>,
    next_seq: u64,
}

impl LayerStack {
    /// Empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer. Singleton kinds go through [`LayerStack::replace_singleton`] so the
    /// at-most-one invariant holds regardless of the entry point.
    pub fn add_layer(&mut self, layer: Layer) {
        let kind = layer.kind();
        if kind.is_singleton() {
            self.replace_singleton(kind, layer);
            return;
        }
        self.push(layer);
    }

    /// Remove every layer matching `pred`; returns how many were removed.
    pub fn remove_layers(&mut self, mut pred: impl FnMut(&Layer) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !pred(&e.layer));
        before - self.entries.len()
    }

    /// Replace the single layer of `kind` with `layer`.
    ///
    /// No-op returning `false` when `kind` is not a singleton kind or `layer` is of another kind.
    pub fn replace_singleton(&mut self, kind: LayerKind, layer: Layer) -> bool {
        if !kind.is_singleton() || layer.kind() != kind {
            return false;
        }
        self.entries.retain(|e| e.layer.kind() != kind);
        self.push(layer);
        true
    }

    /// Swap background and tint in one step, so no render can observe one without the other.
    pub fn replace_product_layers(&mut self, background: BackgroundLayer, tint: TintLayer) {
        self.entries
            .retain(|e| !matches!(e.layer.kind(), LayerKind::Background | LayerKind::Tint));
        self.push(Layer::Background(background));
        self.push(Layer::Tint(tint));
    }

    /// Replace only the tint layer (color change with an unchanged product photo).
    pub fn replace_tint(&mut self, tint: TintLayer) -> bool {
        self.replace_singleton(LayerKind::Tint, Layer::Tint(tint))
    }

    /// Drop ink strokes and the design object; returns how many layers were removed.
    pub fn clear_user_content(&mut self) -> usize {
        self.remove_layers(|l| matches!(l.kind(), LayerKind::InkStroke | LayerKind::DesignObject))
    }

    /// Layers lowest-first in the fixed z-order.
    pub fn render_order(&self) -> Vec<&Layer> {
        let mut ordered: Vec<&Entry> = self.entries.iter().collect();
        ordered.sort_by_key(|e| (e.layer.kind(), e.seq));
        ordered.into_iter().map(|e| &e.layer).collect()
    }

    /// The single layer of a singleton `kind`, if present.
    pub fn singleton(&self, kind: LayerKind) -> Option<&Layer> {
        if !kind.is_singleton() {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.layer.kind() == kind)
            .map(|e| &e.layer)
    }

    /// Background layer, if a product is loaded.
    pub fn background(&self) -> Option<&BackgroundLayer> {
        match self.singleton(LayerKind::Background) {
            Some(Layer::Background(b)) => Some(b),
            _ => None,
        }
    }

    /// Tint layer, if a product is loaded.
    pub fn tint(&self) -> Option<&TintLayer> {
        match self.singleton(LayerKind::Tint) {
            Some(Layer::Tint(t)) => Some(t),
            _ => None,
        }
    }

    /// The design object, if one was uploaded.
    pub fn design(&self) -> Option<&DesignObject> {
        match self.singleton(LayerKind::DesignObject) {
            Some(Layer::DesignObject(d)) => Some(d),
            _ => None,
        }
    }

    /// Mutable access to the design object.
    pub fn design_mut(&mut self) -> Option<&mut DesignObject> {
        self.entries.iter_mut().find_map(|e| match &mut e.layer {
            Layer::DesignObject(d) => Some(d),
            _ => None,
        })
    }

    /// Ink strokes in creation order.
    pub fn ink_strokes(&self) -> impl Iterator<Item = &InkStroke> {
        self.render_order().into_iter().filter_map(|l| match l {
            Layer::InkStroke(s) => Some(s),
            _ => None,
        })
    }

    /// Number of layers of `kind`.
    pub fn count(&self, kind: LayerKind) -> usize {
        self.entries.iter().filter(|e| e.layer.kind() == kind).count()
    }

    /// Total number of layers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no layer is present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, layer: Layer) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry { seq, layer });
    }
}

/// Stacks are equal when they render the same layers in the same order.
impl PartialEq for LayerStack {
    fn eq(&self, other: &Self) -> bool {
        self.render_order() == other.render_order()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/stack.rs"]
mod tests;
