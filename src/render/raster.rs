use image::imageops::{self, FilterType};

use crate::{
    config::RenderConfig,
    foundation::core::{RenderSize, Rgba8, Size},
    foundation::error::{MontageError, MontageResult},
    media::{decode::upright_pixels, item::StillImage},
    render::pool::PixelBuffer,
    transform::orientation::{FittedTransform, Orientation, ScalePolicy, resolve_transform_with},
};

/// Non-animated synthesis of render-sized, fully opaque frames for the streaming encoder.
#[derive(Clone, Debug)]
pub struct RasterSynthesizer {
    size: RenderSize,
    policy: ScalePolicy,
    background: Rgba8,
}

impl RasterSynthesizer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            size: config.size,
            policy: config.scale_policy(),
            background: Rgba8 {
                a: 255,
                ..config.background
            },
        }
    }

    pub fn size(&self) -> RenderSize {
        self.size
    }

    /// Still image scaled per the content-fit mode and centered on the background.
    pub fn render_still(&self, still: &StillImage) -> MontageResult<image::RgbaImage> {
        let fitted = resolve_transform_with(
            still.natural_size(),
            still.intrinsic_transform(),
            self.size,
            self.policy,
        );
        let upright = upright_pixels(still.pixels(), still.orientation());
        Ok(self.compose(&upright, &fitted))
    }

    /// One decoded clip frame in natural pixel space, placed with the segment's transform.
    pub fn render_clip_frame(
        &self,
        rgba: &[u8],
        natural: (u32, u32),
        fitted: &FittedTransform,
    ) -> MontageResult<image::RgbaImage> {
        let frame = image::RgbaImage::from_raw(natural.0, natural.1, rgba.to_vec())
            .ok_or_else(|| MontageError::media("clip frame byte length mismatch"))?;
        let upright = match fitted.orientation {
            Orientation::Up => frame,
            o => upright_pixels(&frame, o),
        };
        Ok(self.compose(&upright, fitted))
    }

    /// Render-sized canvas holding only the background.
    pub fn blank(&self) -> image::RgbaImage {
        image::RgbaImage::from_pixel(
            self.size.width,
            self.size.height,
            image::Rgba(self.background.to_array()),
        )
    }

    fn compose(&self, upright: &image::RgbaImage, fitted: &FittedTransform) -> image::RgbaImage {
        let mut canvas = self.blank();
        let display = Size::new(f64::from(upright.width()), f64::from(upright.height()));
        let w = (display.width * fitted.scale).round() as u32;
        let h = (display.height * fitted.scale).round() as u32;
        if w > 0 && h > 0 {
            let scaled = if (w, h) == upright.dimensions() {
                upright.clone()
            } else {
                imageops::resize(upright, w, h, FilterType::Triangle)
            };
            imageops::overlay(
                &mut canvas,
                &scaled,
                fitted.offset.x.round() as i64,
                fitted.offset.y.round() as i64,
            );
        }
        for px in canvas.pixels_mut() {
            px.0[3] = 255;
        }
        canvas
    }

    /// Copy a prepared canvas into a checked-out buffer.
    pub fn write_into(
        &self,
        canvas: &image::RgbaImage,
        buf: &mut PixelBuffer<'_>,
    ) -> MontageResult<()> {
        if canvas.dimensions() != (buf.size().width, buf.size().height) {
            return Err(MontageError::validation(format!(
                "canvas is {}x{}, buffer is {}x{}",
                canvas.width(),
                canvas.height(),
                buf.size().width,
                buf.size().height
            )));
        }
        buf.data_mut().copy_from_slice(canvas.as_raw());
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
