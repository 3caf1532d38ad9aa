use std::io::Cursor;

use super::*;

fn encode_png(img: image::RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_png_keeps_dimensions_and_straight_alpha() {
    let src = image::RgbaImage::from_raw(2, 1, vec![100, 50, 200, 128, 1, 2, 3, 255]).unwrap();
    let still = decode_image(&encode_png(src)).unwrap();

    assert_eq!(still.pixels().dimensions(), (2, 1));
    assert_eq!(still.pixels().as_raw(), &vec![100, 50, 200, 128, 1, 2, 3, 255]);
    assert_eq!(still.orientation(), Orientation::Up);
}

#[test]
fn decode_rejects_garbage() {
    assert!(decode_image(b"definitely not an image").is_err());
}

#[test]
fn upright_pixels_rotates_portrait_tags() {
    let mut img = image::RgbaImage::new(3, 2);
    img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));

    let right = upright_pixels(&img, Orientation::Right);
    assert_eq!(right.dimensions(), (2, 3));
    // Top-left moves to top-right after a clockwise quarter turn.
    assert_eq!(right.get_pixel(1, 0), &image::Rgba([255, 0, 0, 255]));

    let down = upright_pixels(&img, Orientation::Down);
    assert_eq!(down.dimensions(), (3, 2));
    assert_eq!(down.get_pixel(2, 1), &image::Rgba([255, 0, 0, 255]));

    let left = upright_pixels(&img, Orientation::Left);
    assert_eq!(left.get_pixel(0, 2), &image::Rgba([255, 0, 0, 255]));
}
