use std::io::Cursor;
use std::path::Path;

use anyhow::Context;
use image::ImageDecoder as _;

use crate::{
    foundation::error::MontageResult, media::item::StillImage,
    transform::orientation::Orientation,
};

/// Decode an encoded still (PNG, JPEG, ...) and read its EXIF orientation when present.
pub fn decode_image(bytes: &[u8]) -> MontageResult<StillImage> {
    let mut decoder = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("guess image format")?
        .into_decoder()
        .context("open image decoder")?;
    let orientation = decoder
        .orientation()
        .map(orientation_from_exif)
        .unwrap_or_default();
    let dyn_img = image::DynamicImage::from_decoder(decoder).context("decode image from memory")?;
    Ok(StillImage::new(dyn_img.to_rgba8(), orientation))
}

pub fn load_image(path: &Path) -> MontageResult<StillImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes)
}

/// Flips are not representable by the four canonical orientations; they decode as `Up`.
fn orientation_from_exif(o: image::metadata::Orientation) -> Orientation {
    use image::metadata::Orientation as Exif;
    match o {
        Exif::Rotate90 => Orientation::Right,
        Exif::Rotate180 => Orientation::Down,
        Exif::Rotate270 => Orientation::Left,
        _ => Orientation::Up,
    }
}

/// Rotate stored pixels so they display upright.
pub(crate) fn upright_pixels(
    pixels: &image::RgbaImage,
    orientation: Orientation,
) -> image::RgbaImage {
    match orientation {
        Orientation::Up => pixels.clone(),
        Orientation::Right => image::imageops::rotate90(pixels),
        Orientation::Down => image::imageops::rotate180(pixels),
        Orientation::Left => image::imageops::rotate270(pixels),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/decode.rs"]
mod tests;
