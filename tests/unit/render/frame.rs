use super::*;

fn frame() -> CanvasFrame {
    // Opaque red, then half-transparent white (premultiplied).
    let data = vec![255, 0, 0, 255, 128, 128, 128, 128];
    CanvasFrame::from_premul(Canvas::new(2, 1).unwrap(), data).unwrap()
}

#[test]
fn rejects_mismatched_buffer() {
    let c = Canvas::new(2, 2).unwrap();
    assert!(CanvasFrame::from_premul(c, vec![0; 4]).is_err());
}

#[test]
fn pixel_is_unpremultiplied() {
    let f = frame();
    assert_eq!(f.pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(f.pixel(1, 0), Some([255, 255, 255, 128]));
    assert_eq!(f.pixel(2, 0), None);
}

#[test]
fn png_round_trips_through_decoder() {
    let f = frame();
    let png = f.encode_png().unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let back = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(back.dimensions(), (2, 1));
    assert_eq!(back.into_raw(), f.to_rgba8());
}

#[test]
fn data_uri_has_png_prefix() {
    let uri = frame().to_data_uri().unwrap();
    assert!(uri.starts_with("data:image/png;base64,iVBORw0KGgo"));
}
