use std::io::Cursor;

use base64::Engine as _;

use super::*;

fn png_bytes(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_keeps_straight_alpha() {
    let prepared = decode_image(&png_bytes(1, 1, [100, 50, 200, 128])).unwrap();
    assert_eq!(prepared.width, 1);
    assert_eq!(prepared.height, 1);
    assert_eq!(prepared.rgba8.as_slice(), &[100, 50, 200, 128]);
}

#[test]
fn decode_image_rejects_garbage() {
    assert!(matches!(decode_image(b""), Err(DrapeError::Decode(_))));
    assert!(matches!(
        decode_image(b"definitely not an image"),
        Err(DrapeError::Decode(_))
    ));
}

#[test]
fn decode_data_uri_and_bare_base64() {
    let png = png_bytes(3, 2, [1, 2, 3, 255]);
    let b64 = base64::engine::general_purpose::STANDARD.encode(&png);

    let a = decode_data_uri(&format!("data:image/png;base64,{b64}")).unwrap();
    let b = decode_data_uri(&b64).unwrap();
    assert_eq!((a.width, a.height), (3, 2));
    assert_eq!(a, b);

    assert!(decode_data_uri("data:image/png,abc").is_err());
    assert!(decode_data_uri("data:image/png;base64,@@@").is_err());
}
