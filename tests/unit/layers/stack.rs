use proptest::prelude::*;

use super::*;
use crate::assets::color::TintColor;
use crate::assets::prepared::PreparedImage;
use crate::design::manager::{DesignObject, DesignTransform};
use crate::effects::tint::TintBlend;
use crate::foundation::core::Point;
use crate::ink::recorder::InkRecorder;

fn img(v: u8) -> PreparedImage {
    PreparedImage::solid(2, 2, [v, v, v, 255]).unwrap()
}

fn background(v: u8) -> BackgroundLayer {
    BackgroundLayer { image: img(v) }
}

fn tint(v: u8) -> TintLayer {
    TintLayer {
        image: img(v),
        color: TintColor::default(),
        blend: TintBlend::default(),
    }
}

fn design(v: u8) -> DesignObject {
    DesignObject {
        image: img(v),
        transform: DesignTransform {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        },
    }
}

/// Single-point stroke whose x coordinate tags it.
fn stroke(tag: u32) -> InkStroke {
    let mut r = InkRecorder::default();
    r.pointer_down(Point::new(f64::from(tag), 0.0));
    r.pointer_up().unwrap()
}

fn kinds(stack: &LayerStack) -> Vec<LayerKind> {
    stack.render_order().iter().map(|l| l.kind()).collect()
}

fn stroke_tags(stack: &LayerStack) -> Vec<u32> {
    stack
        .ink_strokes()
        .map(|s| s.points().next().unwrap().x as u32)
        .collect()
}

#[test]
fn render_order_ignores_insertion_order() {
    let mut s = LayerStack::new();
    s.add_layer(Layer::DesignObject(design(1)));
    s.add_layer(Layer::InkStroke(stroke(1)));
    s.add_layer(Layer::Tint(tint(1)));
    s.add_layer(Layer::InkStroke(stroke(2)));
    s.add_layer(Layer::Background(background(1)));

    assert_eq!(
        kinds(&s),
        vec![
            LayerKind::Background,
            LayerKind::Tint,
            LayerKind::InkStroke,
            LayerKind::InkStroke,
            LayerKind::DesignObject,
        ]
    );
    assert_eq!(stroke_tags(&s), vec![1, 2]);
}

#[test]
fn add_layer_keeps_singletons_unique() {
    let mut s = LayerStack::new();
    s.add_layer(Layer::DesignObject(design(1)));
    s.add_layer(Layer::DesignObject(design(2)));
    assert_eq!(s.count(LayerKind::DesignObject), 1);
    assert_eq!(s.design(), Some(&design(2)));
}

#[test]
fn replace_singleton_rejects_ink_and_mismatch() {
    let mut s = LayerStack::new();
    assert!(!s.replace_singleton(LayerKind::InkStroke, Layer::InkStroke(stroke(1))));
    assert!(!s.replace_singleton(LayerKind::Tint, Layer::Background(background(1))));
    assert!(s.is_empty());

    assert!(s.replace_singleton(LayerKind::Background, Layer::Background(background(1))));
    assert!(s.replace_singleton(LayerKind::Background, Layer::Background(background(2))));
    assert_eq!(s.count(LayerKind::Background), 1);
    assert_eq!(s.background(), Some(&background(2)));
}

#[test]
fn replace_product_layers_swaps_both() {
    let mut s = LayerStack::new();
    s.replace_product_layers(background(1), tint(1));
    s.add_layer(Layer::InkStroke(stroke(7)));
    s.replace_product_layers(background(2), tint(2));

    assert_eq!(s.len(), 3);
    assert_eq!(s.background(), Some(&background(2)));
    assert_eq!(s.tint(), Some(&tint(2)));
    assert_eq!(stroke_tags(&s), vec![7]);
}

#[test]
fn remove_layers_counts_matches() {
    let mut s = LayerStack::new();
    s.add_layer(Layer::InkStroke(stroke(1)));
    s.add_layer(Layer::InkStroke(stroke(2)));
    s.add_layer(Layer::InkStroke(stroke(3)));
    let removed = s.remove_layers(|l| match l {
        Layer::InkStroke(st) => st.points().next().unwrap().x == 2.0,
        _ => false,
    });
    assert_eq!(removed, 1);
    assert_eq!(stroke_tags(&s), vec![1, 3]);
}

#[test]
fn clear_user_content_is_idempotent() {
    let mut s = LayerStack::new();
    s.replace_product_layers(background(1), tint(1));
    s.add_layer(Layer::InkStroke(stroke(1)));
    s.add_layer(Layer::DesignObject(design(1)));

    assert_eq!(s.clear_user_content(), 2);
    let once = s.clone();
    assert_eq!(s.clear_user_content(), 0);
    assert_eq!(s, once);
    assert_eq!(kinds(&s), vec![LayerKind::Background, LayerKind::Tint]);
}

#[test]
fn singleton_lookup_ignores_ink() {
    let mut s = LayerStack::new();
    s.add_layer(Layer::InkStroke(stroke(1)));
    assert!(s.singleton(LayerKind::InkStroke).is_none());
}

#[derive(Clone, Debug)]
enum Op {
    Background(u8),
    Tint(u8),
    Product(u8),
    Stroke,
    Design(u8),
    Clear,
    DropFirstStroke,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u8>().prop_map(Op::Background),
        any::<u8>().prop_map(Op::Tint),
        any::<u8>().prop_map(Op::Product),
        Just(Op::Stroke),
        Just(Op::Stroke),
        any::<u8>().prop_map(Op::Design),
        Just(Op::Clear),
        Just(Op::DropFirstStroke),
    ]
}

proptest! {
    #[test]
    fn render_order_invariant_holds(ops in proptest::collection::vec(op(), 0..40)) {
        let mut s = LayerStack::new();
        let mut expected_tags: Vec<u32> = Vec::new();
        let mut next_tag = 0u32;
        let mut last_design = None;

        for op in ops {
            match op {
                Op::Background(v) => s.add_layer(Layer::Background(background(v))),
                Op::Tint(v) => s.add_layer(Layer::Tint(tint(v))),
                Op::Product(v) => s.replace_product_layers(background(v), tint(v)),
                Op::Stroke => {
                    s.add_layer(Layer::InkStroke(stroke(next_tag)));
                    expected_tags.push(next_tag);
                    next_tag += 1;
                }
                Op::Design(v) => {
                    s.add_layer(Layer::DesignObject(design(v)));
                    last_design = Some(design(v));
                }
                Op::Clear => {
                    s.clear_user_content();
                    expected_tags.clear();
                    last_design = None;
                }
                Op::DropFirstStroke => {
                    if let Some(first) = expected_tags.first().copied() {
                        s.remove_layers(|l| match l {
                            Layer::InkStroke(st) => {
                                st.points().next().map(|p| p.x as u32) == Some(first)
                            }
                            _ => false,
                        });
                        expected_tags.remove(0);
                    }
                }
            }

            let k = kinds(&s);
            prop_assert!(k.windows(2).all(|w| w[0] <= w[1]));
            prop_assert!(s.count(LayerKind::Background) <= 1);
            prop_assert!(s.count(LayerKind::Tint) <= 1);
            prop_assert!(s.count(LayerKind::DesignObject) <= 1);
            prop_assert_eq!(stroke_tags(&s), expected_tags.clone());
            prop_assert_eq!(s.design(), last_design.as_ref());
        }
    }
}
