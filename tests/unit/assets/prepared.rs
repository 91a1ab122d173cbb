use super::*;

#[test]
fn rejects_mismatched_buffers() {
    assert!(PreparedImage::from_rgba8(2, 2, vec![0; 15]).is_err());
    assert!(PreparedImage::from_rgba8(0, 2, vec![]).is_err());
}

#[test]
fn ids_follow_content() {
    let a = PreparedImage::solid(2, 2, [1, 2, 3, 255]).unwrap();
    let b = PreparedImage::solid(2, 2, [1, 2, 3, 255]).unwrap();
    let c = PreparedImage::solid(2, 2, [1, 2, 4, 255]).unwrap();
    let d = PreparedImage::solid(1, 4, [1, 2, 3, 255]).unwrap();
    assert_eq!(a.id(), b.id());
    assert_eq!(a, b);
    assert_ne!(a.id(), c.id());
    assert_ne!(a.id(), d.id());
}

#[test]
fn pixel_lookup_and_aspect() {
    let mut buf = vec![0u8; 3 * 2 * 4];
    let i = (3 + 2) * 4; // row 1, column 2
    buf[i..i + 4].copy_from_slice(&[9, 8, 7, 6]);
    let img = PreparedImage::from_rgba8(3, 2, buf).unwrap();
    assert_eq!(img.pixel(2, 1), Some([9, 8, 7, 6]));
    assert_eq!(img.pixel(3, 0), None);
    assert!((img.aspect_ratio() - 1.5).abs() < 1e-12);
}
