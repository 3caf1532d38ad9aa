//! Layered strategy: a persistent layer graph with time-keyed effects.
//!
//! The graph is built once per export. A renderer samples it at any instant; nothing here is
//! computed per frame.

use std::path::PathBuf;

use crate::{
    config::{CaptionAnchor, RenderConfig},
    foundation::core::{Affine, Fps, MediaTime, Point, RenderSize, Rgba8},
    foundation::error::MontageResult,
    media::{
        decode::{load_image, upright_pixels},
        item::{StillImage, VideoTrack},
    },
    timeline::{
        anim::{AnimationDescriptor, LayerState},
        model::{FillerClip, SegmentSource, Timeline},
    },
    transform::orientation::{FittedTransform, resolve_transform},
};

#[derive(Clone, Debug)]
pub enum BaseContent {
    Video { source: PathBuf, track: VideoTrack },
    /// Filler under a still. `None` means the solid background.
    Filler(Option<(PathBuf, VideoTrack)>),
}

/// One span of the base video layer.
#[derive(Clone, Debug)]
pub struct BaseItem {
    pub insert: MediaTime,
    pub duration: MediaTime,
    pub content: BaseContent,
    pub transform: FittedTransform,
    /// Absolute time base.
    pub effects: Vec<AnimationDescriptor>,
}

impl BaseItem {
    pub fn end(&self) -> MediaTime {
        self.insert + self.duration
    }
}

#[derive(Clone, Debug, Default)]
pub struct BaseLayer {
    pub items: Vec<BaseItem>,
}

impl BaseLayer {
    pub fn item_at(&self, t: MediaTime) -> Option<&BaseItem> {
        let idx = self.items.partition_point(|i| i.insert <= t);
        let item = self.items.get(idx.checked_sub(1)?)?;
        (t < item.end()).then_some(item)
    }
}

/// A still on its own layer above the base, visible only during its segment.
#[derive(Clone, Debug)]
pub struct ImageLayer {
    /// Index of the originating input item.
    pub item: usize,
    pub image: StillImage,
    pub begin: MediaTime,
    pub end: MediaTime,
    pub transform: FittedTransform,
    /// Absolute time base.
    pub effects: Vec<AnimationDescriptor>,
}

impl ImageLayer {
    pub fn state_at(&self, t: MediaTime) -> Option<LayerState> {
        (self.begin <= t && t < self.end).then(|| LayerState::sample(&self.effects, t))
    }
}

/// Pre-rendered caption, uprighted, with its top-left in render space.
#[derive(Clone, Debug)]
pub struct CaptionLayer {
    pub image: image::RgbaImage,
    pub origin: Point,
}

#[derive(Clone, Debug)]
pub struct LayerGraph {
    pub size: RenderSize,
    pub fps: Fps,
    pub background: Rgba8,
    pub duration: MediaTime,
    pub base: BaseLayer,
    pub overlays: Vec<ImageLayer>,
    pub caption: Option<CaptionLayer>,
}

impl LayerGraph {
    pub fn total_frames(&self) -> u64 {
        self.duration.frames_at(self.fps)
    }

    pub fn effect_count(&self) -> usize {
        self.base.items.iter().map(|i| i.effects.len()).sum::<usize>()
            + self.overlays.iter().map(|l| l.effects.len()).sum::<usize>()
    }
}

/// Combine a fitted transform with sampled layer state; scale pivots on the render center.
pub fn animated_affine(base: Affine, state: &LayerState, size: RenderSize) -> Affine {
    let c = size.center().to_vec2();
    Affine::translate(c + state.position)
        * Affine::scale(state.scale)
        * Affine::translate(-c)
        * base
}

pub struct LayerSynthesizer;

impl LayerSynthesizer {
    #[tracing::instrument(level = "debug", skip_all, fields(segments = timeline.segments.len()))]
    pub fn build(timeline: &Timeline, config: &RenderConfig) -> MontageResult<LayerGraph> {
        let mut base = BaseLayer::default();
        let mut overlays = Vec::new();

        for seg in &timeline.segments {
            let absolute: Vec<AnimationDescriptor> = seg
                .animations
                .iter()
                .map(|a| a.to_absolute(seg.insert))
                .collect();
            match &seg.source {
                SegmentSource::Video { source, track } => base.items.push(BaseItem {
                    insert: seg.insert,
                    duration: seg.duration,
                    content: BaseContent::Video {
                        source: source.clone(),
                        track: *track,
                    },
                    transform: seg.transform,
                    effects: absolute,
                }),
                SegmentSource::Image { image, filler } => {
                    let (content, transform) = match filler {
                        FillerClip::Solid => (BaseContent::Filler(None), FittedTransform::identity()),
                        FillerClip::Clip(clip) => match clip.track() {
                            Some(track) => (
                                BaseContent::Filler(Some((clip.source().to_path_buf(), *track))),
                                resolve_transform(track.natural_size, track.intrinsic, timeline.size),
                            ),
                            None => (BaseContent::Filler(None), FittedTransform::identity()),
                        },
                    };
                    base.items.push(BaseItem {
                        insert: seg.insert,
                        duration: seg.duration,
                        content,
                        transform,
                        effects: Vec::new(),
                    });
                    overlays.push(ImageLayer {
                        item: seg.index,
                        image: image.clone(),
                        begin: seg.insert,
                        end: seg.end(),
                        transform: seg.transform,
                        effects: absolute,
                    });
                }
            }
        }

        let caption = match &config.caption {
            Some(spec) => {
                let still = load_image(&spec.image)?;
                let upright = upright_pixels(still.pixels(), still.orientation());
                let origin = caption_origin(
                    timeline.size,
                    (upright.width(), upright.height()),
                    spec.anchor,
                    spec.margin,
                );
                Some(CaptionLayer {
                    image: upright,
                    origin,
                })
            }
            None => None,
        };

        let graph = LayerGraph {
            size: timeline.size,
            fps: timeline.fps,
            background: timeline.background,
            duration: timeline.total_duration,
            base,
            overlays,
            caption,
        };
        tracing::debug!(
            base_items = graph.base.items.len(),
            overlays = graph.overlays.len(),
            effects = graph.effect_count(),
            "built layer graph"
        );
        Ok(graph)
    }
}

fn caption_origin(
    render: RenderSize,
    (w, h): (u32, u32),
    anchor: CaptionAnchor,
    margin: f64,
) -> Point {
    let x = (f64::from(render.width) - f64::from(w)) / 2.0;
    let y = match anchor {
        CaptionAnchor::Top => margin,
        CaptionAnchor::Center => (f64::from(render.height) - f64::from(h)) / 2.0,
        CaptionAnchor::Bottom => f64::from(render.height) - f64::from(h) - margin,
    };
    Point::new(x, y)
}

#[cfg(test)]
#[path = "../../tests/unit/render/layers.rs"]
mod tests;
