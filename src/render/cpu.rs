use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    foundation::core::{Affine, FrameIndex, MediaTime, Rgba8},
    foundation::error::{MontageError, MontageResult},
    foundation::math::premultiply_rgba8_in_place,
    media::{item::VideoTrack, reader::ClipFrameReader},
    render::{
        frame::FrameRGBA,
        layers::{BaseContent, LayerGraph, animated_affine},
    },
    timeline::anim::LayerState,
};

/// CPU renderer that samples a [`LayerGraph`] at arbitrary instants.
pub struct LayerRenderer {
    graph: Arc<LayerGraph>,
    width: u16,
    height: u16,
    overlay_paints: HashMap<usize, (vello_cpu::Image, f64, f64)>,
    caption_paint: Option<(vello_cpu::Image, f64, f64)>,
    readers: HashMap<PathBuf, ClipFrameReader>,
}

impl LayerRenderer {
    pub fn new(graph: Arc<LayerGraph>) -> MontageResult<Self> {
        let width: u16 = graph
            .size
            .width
            .try_into()
            .map_err(|_| MontageError::validation("render width exceeds u16"))?;
        let height: u16 = graph
            .size
            .height
            .try_into()
            .map_err(|_| MontageError::validation("render height exceeds u16"))?;
        let caption_paint = match &graph.caption {
            Some(caption) => Some(straight_to_paint(caption.image.clone())?),
            None => None,
        };
        Ok(Self {
            graph,
            width,
            height,
            overlay_paints: HashMap::new(),
            caption_paint,
            readers: HashMap::new(),
        })
    }

    pub fn render_frame(&mut self, frame: FrameIndex) -> MontageResult<FrameRGBA> {
        self.render_at(MediaTime::from_frame(frame, self.graph.fps))
    }

    /// Premultiplied RGBA8 frame of the graph at `t`.
    pub fn render_at(&mut self, t: MediaTime) -> MontageResult<FrameRGBA> {
        let graph = Arc::clone(&self.graph);
        let (w, h) = (f64::from(self.width), f64::from(self.height));
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        let Rgba8 { r, g, b, a } = graph.background;
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));

        if let Some(item) = graph.base.item_at(t) {
            let local = t.saturating_sub(item.insert);
            let clip = match &item.content {
                BaseContent::Video { source, track } => Some((source, track)),
                BaseContent::Filler(Some((source, track))) => Some((source, track)),
                BaseContent::Filler(None) => None,
            };
            if let Some((source, track)) = clip {
                let state = LayerState::sample(&item.effects, t);
                if state.is_visible() {
                    let paint = self.clip_paint(source, track, local)?;
                    let affine = animated_affine(item.transform.affine, &state, graph.size);
                    draw_image(&mut ctx, paint, affine, state.opacity);
                }
            }
        }

        for (idx, layer) in graph.overlays.iter().enumerate() {
            let Some(state) = layer.state_at(t) else {
                continue;
            };
            if !state.is_visible() {
                continue;
            }
            let paint = match self.overlay_paints.get(&idx) {
                Some(p) => p.clone(),
                None => {
                    let p = straight_to_paint(layer.image.pixels().clone())?;
                    self.overlay_paints.insert(idx, p.clone());
                    p
                }
            };
            let affine = animated_affine(layer.transform.affine, &state, graph.size);
            draw_image(&mut ctx, paint, affine, state.opacity);
        }

        if let (Some(caption), Some(paint)) = (&graph.caption, &self.caption_paint) {
            let affine = Affine::translate(caption.origin.to_vec2());
            draw_image(&mut ctx, paint.clone(), affine, 1.0);
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    /// Natural-space paint for the clip frame presented `local` into its span.
    fn clip_paint(
        &mut self,
        source: &Path,
        track: &VideoTrack,
        local: MediaTime,
    ) -> MontageResult<(vello_cpu::Image, f64, f64)> {
        let fps = self.graph.fps;
        if !self.readers.contains_key(source) {
            let reader = ClipFrameReader::new(source, track, fps)?;
            self.readers.insert(source.to_path_buf(), reader);
        }
        let reader = self
            .readers
            .get_mut(source)
            .ok_or_else(|| MontageError::media("clip reader cache miss"))?;
        let (fw, fh) = reader.dimensions();
        let rgba = reader.frame(local.frames_at(fps))?;
        let pixmap = premul_bytes_to_pixmap(rgba, fw, fh)?;
        Ok((pixmap_paint(pixmap), f64::from(fw), f64::from(fh)))
    }
}

fn draw_image(
    ctx: &mut vello_cpu::RenderContext,
    (paint, w, h): (vello_cpu::Image, f64, f64),
    transform: Affine,
    opacity: f64,
) {
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_paint(paint);
    let layered = opacity < 1.0;
    if layered {
        ctx.push_opacity_layer(opacity as f32);
    }
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
    if layered {
        ctx.pop_layer();
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

/// Straight-alpha image to a paint, at its stored (natural) size.
fn straight_to_paint(image: image::RgbaImage) -> MontageResult<(vello_cpu::Image, f64, f64)> {
    let (w, h) = image.dimensions();
    let mut bytes = image.into_raw();
    premultiply_rgba8_in_place(&mut bytes);
    let pixmap = premul_bytes_to_pixmap(&bytes, w, h)?;
    Ok((pixmap_paint(pixmap), f64::from(w), f64::from(h)))
}

fn pixmap_paint(pixmap: vello_cpu::Pixmap) -> vello_cpu::Image {
    vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    }
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> MontageResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| MontageError::validation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| MontageError::validation("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(MontageError::validation("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let pixels = rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

/// Render `graph` at `t` and flatten it onto the background as a straight-alpha image.
pub fn render_still_frame(graph: Arc<LayerGraph>, t: MediaTime) -> MontageResult<image::RgbaImage> {
    let bg = graph.background;
    let mut renderer = LayerRenderer::new(graph)?;
    renderer.render_at(t)?.to_opaque_image(Rgba8 { a: 255, ..bg })
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
