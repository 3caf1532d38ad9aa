use crate::{
    foundation::core::{RenderSize, Rgba8},
    foundation::error::{MontageError, MontageResult},
    foundation::math::flatten_to_opaque_rgba8,
};

/// Owned RGBA8 frame.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// Borrowed RGBA8 frame, as handed to writers.
#[derive(Clone, Copy, Debug)]
pub struct FrameRef<'a> {
    pub width: u32,
    pub height: u32,
    pub data: &'a [u8],
    pub premultiplied: bool,
}

impl FrameRGBA {
    pub fn as_frame_ref(&self) -> FrameRef<'_> {
        FrameRef {
            width: self.width,
            height: self.height,
            data: &self.data,
            premultiplied: self.premultiplied,
        }
    }

    pub fn size(&self) -> RenderSize {
        RenderSize::new(self.width, self.height)
    }

    /// Composite over `bg` and convert to a straight-alpha, fully opaque image.
    pub fn to_opaque_image(&self, bg: Rgba8) -> MontageResult<image::RgbaImage> {
        let mut out = vec![0u8; self.data.len()];
        flatten_to_opaque_rgba8(&mut out, &self.data, self.premultiplied, bg.to_array())?;
        image::RgbaImage::from_raw(self.width, self.height, out)
            .ok_or_else(|| MontageError::validation("frame byte length does not match its size"))
    }
}

impl FrameRef<'_> {
    pub fn size(&self) -> RenderSize {
        RenderSize::new(self.width, self.height)
    }

    pub fn is_opaque(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 255)
    }

    pub fn to_owned_frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.width,
            height: self.height,
            data: self.data.to_vec(),
            premultiplied: self.premultiplied,
        }
    }
}
