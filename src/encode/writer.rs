use std::path::PathBuf;

use crate::{
    foundation::core::{Fps, FrameIndex, MediaTime, RenderSize, Rgba8},
    foundation::error::{MontageError, MontageResult},
    render::frame::FrameRef,
};

/// Configuration handed to a [`VideoWriter`] when its session starts.
#[derive(Debug, Clone, PartialEq)]
pub struct WriterConfig {
    pub size: RenderSize,
    pub fps: Fps,
    pub out_path: PathBuf,
    /// Used to flatten any alpha before encoding.
    pub background: Rgba8,
    /// Total timeline length; audio is cut or padded to it.
    pub duration: MediaTime,
    pub audio: Option<AudioInput>,
}

/// Audio laid under the video: `[start, start + duration)` of `source`, padded with silence.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInput {
    pub source: PathBuf,
    pub start: MediaTime,
    pub duration: MediaTime,
}

impl WriterConfig {
    pub fn validate(&self) -> MontageResult<()> {
        if self.size.width == 0 || self.size.height == 0 {
            return Err(MontageError::validation(
                "writer width/height must be non-zero",
            ));
        }
        if !self.size.width.is_multiple_of(2) || !self.size.height.is_multiple_of(2) {
            return Err(MontageError::validation(
                "writer width/height must be even (required for yuv420p output)",
            ));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(MontageError::validation("fps must be non-zero"));
        }
        Ok(())
    }
}

/// Streaming encoder session.
///
/// Lifecycle: `begin` once, then `push_frame` in strictly increasing `FrameIndex` order while
/// [`is_ready_for_more`](Self::is_ready_for_more) holds, then exactly one of `end` or `abort`.
pub trait VideoWriter: Send {
    fn begin(&mut self, cfg: &WriterConfig) -> MontageResult<()>;

    /// Whether another frame can be pushed without blocking.
    fn is_ready_for_more(&self) -> bool;

    /// Suspend until the writer is ready again (or has failed).
    fn wait_until_ready(&mut self) -> MontageResult<()>;

    fn push_frame(&mut self, idx: FrameIndex, frame: FrameRef<'_>) -> MontageResult<()>;

    /// Finalize the container. The output file is complete once this returns `Ok`.
    fn end(&mut self) -> MontageResult<()>;

    /// Release every resource and remove partial output. Never fails.
    fn abort(&mut self);
}

/// Opens writers for export jobs. One job, one writer.
pub trait WriterFactory: Send + Sync {
    fn create(&self) -> MontageResult<Box<dyn VideoWriter>>;
}
