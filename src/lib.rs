//! Montage: timeline composition and export for photo/video slideshows.
//!
//! Pipeline:
//! - [`TimelineBuilder`] lays [`MediaItem`]s end to end, with orientation-corrected transforms
//!   and per-segment opacity/scale/position animations.
//! - A frame strategy turns the [`Timeline`] into pixels: the raster path
//!   ([`RasterSynthesizer`], pooled buffers, no animation) or the layered path
//!   ([`LayerSynthesizer`] building a [`LayerGraph`] sampled by [`LayerRenderer`]).
//! - [`ExportJob`] drives a [`VideoWriter`] (system `ffmpeg` by default) on a background worker and
//!   reports progress plus exactly one terminal outcome.
#![forbid(unsafe_code)]

pub mod config;
pub mod encode;
pub mod export;
pub mod foundation;
pub mod manifest;
pub mod media;
pub mod render;
pub mod timeline;
pub mod transform;

pub use config::{AudioTrack, CaptionAnchor, CaptionSpec, ContentFit, RenderConfig, TransitionKind};
pub use encode::{
    ffmpeg::{FfmpegWriter, FfmpegWriterFactory, is_ffmpeg_on_path},
    memory::{InMemoryWriter, InMemoryWriterFactory, InMemoryWriterOpts, WriterRecording},
    session::{CompositionExportSession, ExportSession, SessionStatus},
    writer::{AudioInput, VideoWriter, WriterConfig, WriterFactory},
};
pub use export::{
    job::{
        CompletionCallback, ExportHandle, ExportJob, ExportOutcome, ExportOutput, ExportRequest,
        ExportStrategy,
    },
    progress::ProgressCallback,
    state::JobState,
};
pub use foundation::core::{Affine, Fps, FrameIndex, MediaTime, Point, Rect, RenderSize, Rgba8, Size, Vec2};
pub use foundation::error::{ExportError, ExportErrorKind, MontageError, MontageResult};
pub use manifest::{Manifest, ManifestFiller, ManifestItem};
pub use media::{
    decode::{decode_image, load_image},
    item::{MediaItem, StillImage, VideoClip, VideoTrack},
    probe::{AudioInfo, probe_audio, probe_video},
};
pub use render::{
    cpu::{LayerRenderer, render_still_frame},
    frame::{FrameRGBA, FrameRef},
    layers::{LayerGraph, LayerSynthesizer},
    pool::{PixelBuffer, PixelBufferPool, PixelBufferPoolOpts},
    raster::RasterSynthesizer,
};
pub use timeline::{
    anim::{AnimatedProperty, AnimationDescriptor, Ease, LayerState},
    builder::TimelineBuilder,
    model::{FillerClip, SegmentKind, SegmentSource, SkipReason, SkippedItem, Timeline, TimelineSegment},
    motion::{Motion, MotionSequence, MotionSource, SeededMotions},
};
pub use transform::orientation::{
    FittedTransform, Orientation, ScalePolicy, resolve_transform, resolve_transform_with,
};
