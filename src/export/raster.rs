use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    config::RenderConfig,
    encode::writer::VideoWriter,
    export::progress::ProgressReporter,
    foundation::core::{Fps, FrameIndex},
    foundation::error::{ExportError, MontageError, MontageResult},
    media::{item::VideoTrack, reader::ClipFrameReader},
    render::{
        pool::{PixelBufferPool, PixelBufferPoolOpts},
        raster::RasterSynthesizer,
    },
    timeline::model::{SegmentSource, Timeline},
};

/// Last still canvas, keyed by the item index of the segment it belongs to.
struct CanvasCache {
    key: Option<usize>,
    canvas: image::RgbaImage,
}

impl CanvasCache {
    fn get(
        &mut self,
        key: usize,
        render: impl FnOnce() -> MontageResult<image::RgbaImage>,
    ) -> MontageResult<&image::RgbaImage> {
        if self.key != Some(key) {
            self.canvas = render()?;
            self.key = Some(key);
        }
        Ok(&self.canvas)
    }
}

fn reader_for<'r>(
    readers: &'r mut HashMap<PathBuf, ClipFrameReader>,
    source: &Path,
    track: &VideoTrack,
    fps: Fps,
) -> MontageResult<&'r mut ClipFrameReader> {
    if !readers.contains_key(source) {
        readers.insert(source.to_path_buf(), ClipFrameReader::new(source, track, fps)?);
    }
    readers
        .get_mut(source)
        .ok_or_else(|| MontageError::media("clip reader cache miss"))
}

/// Pull loop: one frame per readiness signal, in order, until the timeline is exhausted.
///
/// The writer is left to the caller on error; it is finalized here on success.
/// Returns the number of frames appended.
#[tracing::instrument(level = "debug", skip_all, fields(frames = timeline.total_frames()))]
pub(crate) fn run_raster(
    timeline: &Timeline,
    config: &RenderConfig,
    writer: &mut dyn VideoWriter,
    cancel: &AtomicBool,
    progress: &mut ProgressReporter,
) -> Result<u64, ExportError> {
    let total = timeline.total_frames();
    let fps = timeline.fps;
    let synth = RasterSynthesizer::new(config);
    let mut pool = PixelBufferPool::new(synth.size(), PixelBufferPoolOpts::default())
        .map_err(ExportError::render)?;
    let blank = synth.blank();
    let mut stills = CanvasCache {
        key: None,
        canvas: blank.clone(),
    };
    let mut readers: HashMap<PathBuf, ClipFrameReader> = HashMap::new();

    for i in 0..total {
        if cancel.load(Ordering::Acquire) {
            tracing::debug!(frame = i, "raster export cancelled");
            return Err(ExportError::Cancelled);
        }
        if !writer.is_ready_for_more() {
            writer.wait_until_ready().map_err(ExportError::append)?;
        }

        let idx = FrameIndex(i);
        let t = timeline.frame_time(idx);
        let clip_canvas: image::RgbaImage;
        let canvas = match timeline.segment_at(t) {
            Some(seg) => match &seg.source {
                SegmentSource::Image { image, .. } => stills
                    .get(seg.index, || synth.render_still(image))
                    .map_err(ExportError::render)?,
                SegmentSource::Video { source, track } => {
                    let reader =
                        reader_for(&mut readers, source, track, fps).map_err(ExportError::render)?;
                    let dims = reader.dimensions();
                    let local = t.saturating_sub(seg.insert).frames_at(fps);
                    let rgba = reader.frame(local).map_err(ExportError::render)?;
                    clip_canvas = synth
                        .render_clip_frame(rgba, dims, &seg.transform)
                        .map_err(ExportError::render)?;
                    &clip_canvas
                }
            },
            None => &blank,
        };

        let mut buf = pool.checkout();
        synth
            .write_into(canvas, &mut buf)
            .map_err(ExportError::render)?;
        writer
            .push_frame(idx, buf.as_frame())
            .map_err(ExportError::append)?;
        drop(buf);

        progress.report((i + 1) as f64 / total as f64);
    }

    writer.end().map_err(ExportError::video_writer)?;
    let stats = pool.stats();
    tracing::debug!(
        allocations = stats.allocations,
        checkouts = stats.checkouts,
        "raster export finished"
    );
    Ok(total)
}

#[cfg(test)]
#[path = "../../tests/unit/export/raster.rs"]
mod tests;
