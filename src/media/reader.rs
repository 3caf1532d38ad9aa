use std::path::{Path, PathBuf};

use crate::{
    foundation::core::{FrameIndex, Fps, MediaTime},
    foundation::error::{MontageError, MontageResult},
    media::item::VideoTrack,
};

const DEFAULT_BATCH: u32 = 32;

/// Sequential RGBA8 frame access into a video clip, resampled to the output frame rate.
///
/// Frames come back in natural (unrotated) pixel space; orientation is the caller's concern.
/// Requests past the end of the clip hold the last frame.
#[derive(Debug)]
pub struct ClipFrameReader {
    source: PathBuf,
    width: u32,
    height: u32,
    fps: Fps,
    frame_count: u64,
    batch: u32,
    cache_start: u64,
    cache: Vec<Vec<u8>>,
}

impl ClipFrameReader {
    pub fn new(source: &Path, track: &VideoTrack, fps: Fps) -> MontageResult<Self> {
        let width = track.natural_size.width as u32;
        let height = track.natural_size.height as u32;
        if width == 0 || height == 0 {
            return Err(MontageError::media(format!(
                "video '{}' has zero-sized frames",
                source.display()
            )));
        }
        Ok(Self {
            source: source.to_path_buf(),
            width,
            height,
            fps,
            frame_count: track.duration.frames_at(fps).max(1),
            batch: DEFAULT_BATCH,
            cache_start: 0,
            cache: Vec::new(),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Pixels for clip-local frame `index`.
    pub fn frame(&mut self, index: u64) -> MontageResult<&[u8]> {
        let index = index.min(self.frame_count - 1);
        let cached_end = self.cache_start + self.cache.len() as u64;
        if index < self.cache_start || index >= cached_end {
            self.refill(index)?;
        }
        let slot = (index.saturating_sub(self.cache_start) as usize).min(self.cache.len() - 1);
        Ok(&self.cache[slot])
    }

    fn refill(&mut self, index: u64) -> MontageResult<()> {
        let count = (self.frame_count - index).min(u64::from(self.batch)) as u32;
        let start = MediaTime::from_frame(FrameIndex(index), self.fps);
        let frames = decode_frames_rgba8(
            &self.source,
            (self.width, self.height),
            start,
            self.fps,
            count,
        )?;
        if frames.is_empty() {
            // Container duration overstated the stream; keep holding what we have.
            if self.cache.is_empty() {
                return Err(MontageError::media(format!(
                    "ffmpeg returned no video frames for '{}'",
                    self.source.display()
                )));
            }
            tracing::debug!(source = %self.source.display(), index, "holding last decoded frame");
            return Ok(());
        }
        tracing::trace!(source = %self.source.display(), index, count = frames.len(), "decoded batch");
        self.cache_start = index;
        self.cache = frames;
        Ok(())
    }
}

#[cfg(feature = "media-ffmpeg")]
fn decode_frames_rgba8(
    source: &Path,
    (width, height): (u32, u32),
    start: MediaTime,
    fps: Fps,
    frame_count: u32,
) -> MontageResult<Vec<Vec<u8>>> {
    if frame_count == 0 {
        return Ok(Vec::new());
    }

    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-noautorotate"])
        .args(["-ss", &format!("{:.6}", start.as_secs_f64())])
        .arg("-i")
        .arg(source)
        .args([
            "-vf",
            &format!("fps={}/{}", fps.num, fps.den),
            "-frames:v",
            &frame_count.to_string(),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| MontageError::media(format!("failed to run ffmpeg for video decode: {e}")))?;

    if !out.status.success() {
        return Err(MontageError::media(format!(
            "ffmpeg video decode failed for '{}': {}",
            source.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let frame_len = width as usize * height as usize * 4;
    if !out.stdout.len().is_multiple_of(frame_len) {
        return Err(MontageError::media(format!(
            "decoded video batch has invalid size: got {} bytes, expected multiples of {frame_len}",
            out.stdout.len()
        )));
    }
    Ok(out
        .stdout
        .chunks_exact(frame_len)
        .take(frame_count as usize)
        .map(<[u8]>::to_vec)
        .collect())
}

#[cfg(not(feature = "media-ffmpeg"))]
fn decode_frames_rgba8(
    _source: &Path,
    _dims: (u32, u32),
    _start: MediaTime,
    _fps: Fps,
    _frame_count: u32,
) -> MontageResult<Vec<Vec<u8>>> {
    Err(MontageError::media(
        "video sources require the 'media-ffmpeg' feature",
    ))
}
