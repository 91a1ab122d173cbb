use std::io::Cursor;

use super::*;
use crate::layers::layer::LayerKind;

fn png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

fn descriptor(id: &str) -> ProductDescriptor {
    ProductDescriptor::new(
        id,
        format!("{id}.png"),
        Canvas::new(60, 80).unwrap(),
        PlacementRect::new(15.0, 10.0, 30.0, 40.0),
    )
}

fn session() -> Compositor {
    Compositor::new(CompositorOpts::default().with_canvas(Canvas::new(60, 80).unwrap())).unwrap()
}

fn near(px: [u8; 4], want: [u8; 4]) -> bool {
    px.iter()
        .zip(want.iter())
        .all(|(a, b)| (i32::from(*a) - i32::from(*b)).abs() <= 2)
}

#[test]
fn starts_in_draw_mode_with_placeholder() {
    let c = session();
    assert_eq!(c.mode(), Mode::Draw);
    assert!(c.stack().is_empty());
    assert!(c.product().is_none());
    let px = c.frame().pixel(30, 40).unwrap();
    assert!(near(px, [243, 244, 246, 255]), "{px:?}");
}

#[test]
fn product_load_builds_tinted_layers() {
    let mut c = session();
    c.set_color(Rgb8::new(255, 0, 0)).unwrap();
    let out = c
        .load_product(descriptor("tee"), &png(4, 4, [200, 200, 200, 255]))
        .unwrap();
    assert_eq!(out, DecodeOutcome::Applied);

    assert_eq!(c.stack().count(LayerKind::Background), 1);
    assert_eq!(c.stack().count(LayerKind::Tint), 1);
    assert_eq!(c.product().map(|p| p.id.as_str()), Some("tee"));
    let px = c.frame().pixel(30, 40).unwrap();
    assert!(near(px, [200, 100, 100, 255]), "{px:?}");
}

#[test]
fn color_change_retints_only_tint_layer() {
    let mut c = session();
    c.load_product(descriptor("tee"), &png(4, 4, [200, 200, 200, 255]))
        .unwrap();
    let bg = c.stack().background().cloned();

    c.set_color(Rgb8::new(0, 0, 255)).unwrap();
    assert_eq!(c.stack().background().cloned(), bg);
    let t = c.stack().tint().unwrap();
    assert_eq!(t.color.rgb, Rgb8::new(0, 0, 255));
    assert_eq!(t.image.pixel(0, 0), Some([100, 100, 200, 255]));
}

#[test]
fn invalid_descriptor_is_rejected_up_front() {
    let mut c = session();
    let mut d = descriptor("tee");
    d.id = " ".to_string();
    assert!(c.begin_product_load(d).is_err());
}

#[test]
fn stale_product_decode_is_discarded() {
    let mut c = session();
    let first = c.begin_product_load(descriptor("a")).unwrap();
    let second = c.begin_product_load(descriptor("b")).unwrap();

    assert_eq!(
        c.finish_product_load(first, &png(2, 2, [255, 0, 0, 255])),
        DecodeOutcome::Stale
    );
    assert!(c.product().is_none());

    assert!(c
        .finish_product_load(second, &png(2, 2, [0, 0, 255, 255]))
        .is_applied());
    assert_eq!(c.product().map(|p| p.id.as_str()), Some("b"));

    // Completing a ticket twice does nothing the second time.
    assert_eq!(
        c.finish_product_load(second, &png(2, 2, [0, 255, 0, 255])),
        DecodeOutcome::Stale
    );
}

#[test]
fn failed_product_decode_keeps_previous_frame() {
    let mut c = session();
    c.load_product(descriptor("a"), &png(2, 2, [10, 10, 10, 255]))
        .unwrap();
    let before = c.frame().clone();

    let out = c.load_product(descriptor("b"), b"not an image").unwrap();
    assert!(matches!(out, DecodeOutcome::Failed(_)));
    assert_eq!(c.frame(), &before);
    assert_eq!(c.product().map(|p| p.id.as_str()), Some("a"));
}

#[test]
fn product_canvas_replaces_session_canvas() {
    let mut c = Compositor::new(CompositorOpts::default()).unwrap();
    assert_eq!(c.canvas(), Canvas::new(600, 800).unwrap());
    c.load_product(descriptor("small"), &png(2, 2, [1, 1, 1, 255]))
        .unwrap();
    assert_eq!(c.canvas(), Canvas::new(60, 80).unwrap());
    assert_eq!((c.frame().width, c.frame().height), (60, 80));
}

#[test]
fn design_upload_switches_to_select() {
    let mut c = session();
    c.load_product(descriptor("tee"), &png(2, 2, [200, 200, 200, 255]))
        .unwrap();
    assert!(c.load_design(&png(6, 4, [0, 255, 0, 255])).is_applied());

    assert_eq!(c.mode(), Mode::Select);
    assert!(c.is_design_selected());
    let d = c.design().unwrap();
    assert_eq!(d.bounds(), Rect::new(15.0, 20.0, 45.0, 40.0));
}

#[test]
fn failed_design_upload_changes_nothing() {
    let mut c = session();
    let out = c.load_design(b"\x89PNG garbage");
    assert!(matches!(out, DecodeOutcome::Failed(_)));
    assert_eq!(c.mode(), Mode::Draw);
    assert!(c.design().is_none());
}

#[test]
fn newer_design_upload_supersedes_pending_one() {
    let mut c = session();
    let old = c.begin_design_load();
    let new = c.begin_design_load();
    assert!(c.finish_design_load(new, &png(2, 2, [0, 0, 255, 255])).is_applied());
    assert_eq!(
        c.finish_design_load(old, &png(2, 2, [255, 0, 0, 255])),
        DecodeOutcome::Stale
    );
    assert_eq!(c.design().unwrap().image.pixel(0, 0), Some([0, 0, 255, 255]));
}

#[test]
fn design_from_data_uri() {
    use base64::Engine as _;
    let uri = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png(3, 3, [9, 9, 9, 255]))
    );
    let mut c = session();
    assert!(c.load_design_data_uri(&uri).is_applied());
    assert_eq!(c.design().unwrap().image.width, 3);
}

#[test]
fn mode_switch_finishes_stroke_in_progress() {
    let mut c = session();
    c.pointer_down(Point::new(5.0, 5.0)).unwrap();
    c.pointer_move(Point::new(20.0, 5.0)).unwrap();
    assert_eq!(c.recorder_state(), RecorderState::Recording);

    c.set_mode(Mode::Select).unwrap();
    assert_eq!(c.recorder_state(), RecorderState::Idle);
    assert_eq!(c.stack().count(LayerKind::InkStroke), 1);
}

#[test]
fn live_stroke_is_rendered_before_pointer_up() {
    let mut c = session();
    c.set_brush(Brush::new(Rgb8::BLACK, 6.0));
    c.pointer_down(Point::new(5.0, 40.0)).unwrap();
    c.pointer_move(Point::new(55.0, 40.0)).unwrap();
    assert_eq!(c.stack().count(LayerKind::InkStroke), 0);
    assert!(near(c.frame().pixel(30, 40).unwrap(), [0, 0, 0, 255]));
}

#[test]
fn programmatic_transforms_need_select_mode() {
    let mut c = session();
    c.load_design(&png(2, 2, [1, 2, 3, 255]));
    c.set_mode(Mode::Draw).unwrap();
    assert!(!c.move_design_by(Vec2::new(5.0, 5.0)).unwrap());
    assert!(!c.scale_design(2.0).unwrap());

    c.set_mode(Mode::Select).unwrap();
    let x = c.design().unwrap().transform.x;
    assert!(c.move_design_by(Vec2::new(5.0, 0.0)).unwrap());
    assert_eq!(c.design().unwrap().transform.x, x + 5.0);
}

#[test]
fn display_frame_adds_handles_but_export_does_not() {
    let mut c = session();
    c.load_design(&png(6, 4, [0, 255, 0, 255]));
    let shown = c.display_frame().unwrap();
    assert_ne!(&shown, c.frame());

    let exported = image::load_from_memory(&c.export_png().unwrap())
        .unwrap()
        .to_rgba8();
    assert_eq!(exported.into_raw(), c.frame().to_rgba8());

    c.set_mode(Mode::Draw).unwrap();
    assert_eq!(&c.display_frame().unwrap(), c.frame());
}

#[test]
fn dispatch_maps_client_coordinates() {
    let mut c = session();
    let container = ContainerBox::new(100.0, 100.0, 30.0, 40.0);
    c.dispatch(InputEvent::PointerDown(PointerPos::client(container, 110.0, 110.0)))
        .unwrap();
    c.dispatch(InputEvent::PointerUp).unwrap();

    let stroke = c.stack().ink_strokes().next().unwrap();
    assert_eq!(stroke.points().next(), Some(Point::new(20.0, 20.0)));
}

#[test]
fn dispatch_routes_controls() {
    let mut c = session();
    c.dispatch(InputEvent::BrushColor {
        color: Rgb8::new(1, 2, 3),
    })
    .unwrap();
    c.dispatch(InputEvent::BrushWidth { width: 99.0 }).unwrap();
    c.dispatch(InputEvent::TintColor {
        color: Rgb8::new(4, 5, 6),
    })
    .unwrap();
    c.dispatch(InputEvent::SetMode { mode: Mode::Select })
        .unwrap();

    assert_eq!(c.brush(), Brush::new(Rgb8::new(1, 2, 3), 20.0));
    assert_eq!(c.color().rgb, Rgb8::new(4, 5, 6));
    assert_eq!(c.mode(), Mode::Select);
}

fn oversized_png() -> Vec<u8> {
    png(70_000, 1, [255, 0, 0, 255])
}

#[test]
fn unrenderable_design_changes_nothing() {
    let mut c = session();
    c.load_product(descriptor("tee"), &png(2, 2, [200, 200, 200, 255]))
        .unwrap();
    c.pointer_down(Point::new(5.0, 5.0)).unwrap();
    c.pointer_move(Point::new(20.0, 20.0)).unwrap();
    c.pointer_up().unwrap();
    let stack = c.stack().clone();
    let frame = c.frame().clone();

    let out = c.load_design(&oversized_png());
    assert!(matches!(out, DecodeOutcome::Failed(_)));
    assert_eq!(c.mode(), Mode::Draw);
    assert!(c.design().is_none());
    assert!(!c.is_design_selected());
    assert_eq!(c.stack(), &stack);
    assert_eq!(c.frame(), &frame);

    c.pointer_down(Point::new(30.0, 30.0)).unwrap();
    c.pointer_up().unwrap();
    assert_eq!(c.stack().count(LayerKind::InkStroke), 2);
    c.clear().unwrap();
    c.render().unwrap();
}

#[test]
fn unrenderable_product_keeps_previous_product() {
    let mut c = session();
    c.load_product(descriptor("a"), &png(2, 2, [10, 10, 10, 255]))
        .unwrap();
    let stack = c.stack().clone();
    let frame = c.frame().clone();

    let mut other = descriptor("b");
    other.canvas = Canvas::new(30, 40).unwrap();
    let out = c.load_product(other, &oversized_png()).unwrap();
    assert!(matches!(out, DecodeOutcome::Failed(_)));

    assert_eq!(c.product().map(|p| p.id.as_str()), Some("a"));
    assert_eq!(c.canvas(), Canvas::new(60, 80).unwrap());
    assert_eq!(c.stack(), &stack);
    assert_eq!(c.frame(), &frame);

    c.clear().unwrap();
    assert_eq!(c.render().unwrap(), &frame);
    assert!(c
        .load_product(descriptor("c"), &png(2, 2, [0, 0, 255, 255]))
        .unwrap()
        .is_applied());
}

#[test]
fn rollback_restores_checkpointed_state() {
    let mut c = session();
    c.pointer_down(Point::new(5.0, 5.0)).unwrap();
    let checkpoint = c.checkpoint();

    assert!(c.load_design(&png(4, 4, [0, 255, 0, 255])).is_applied());
    assert_eq!(c.mode(), Mode::Select);
    assert_eq!(c.stack().count(LayerKind::InkStroke), 1);

    c.rollback(checkpoint);
    assert_eq!(c.mode(), Mode::Draw);
    assert!(c.design().is_none());
    assert!(c.stack().is_empty());
    assert_eq!(c.recorder_state(), RecorderState::Recording);
}
