use std::io::{Read, Write as _};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

use anyhow::Context as _;

use crate::{
    encode::writer::{AudioInput, VideoWriter, WriterConfig, WriterFactory},
    foundation::core::{Fps, FrameIndex},
    foundation::error::{MontageError, MontageResult},
    foundation::math::flatten_to_opaque_rgba8,
    render::frame::FrameRef,
};

/// Writer that spawns the system `ffmpeg` and streams raw RGBA frames to its stdin.
///
/// Pipe writes block when ffmpeg falls behind, so the writer is always ready between frames.
#[derive(Default)]
pub struct FfmpegWriter {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: Vec<u8>,
    cfg: Option<WriterConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn command(cfg: &WriterConfig) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.size.width, cfg.size.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0"]);

        match cfg.audio.as_ref() {
            Some(audio) => push_audio_args(&mut cmd, audio, cfg),
            None => {
                cmd.args([
                    "-an",
                    "-c:v",
                    "libx264",
                    "-pix_fmt",
                    "yuv420p",
                    "-movflags",
                    "+faststart",
                ]);
            }
        }
        cmd.arg(&cfg.out_path);
        cmd
    }

    fn reap(&mut self) -> MontageResult<(std::process::ExitStatus, Vec<u8>)> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| MontageError::encode("ffmpeg writer not started"))?;
        let status = child
            .wait()
            .map_err(|e| MontageError::encode(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| MontageError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| MontageError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        Ok((status, stderr_bytes))
    }
}

impl VideoWriter for FfmpegWriter {
    #[tracing::instrument(level = "debug", skip_all, fields(out = %cfg.out_path.display()))]
    fn begin(&mut self, cfg: &WriterConfig) -> MontageResult<()> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;
        if !is_ffmpeg_on_path() {
            return Err(MontageError::encode(
                "ffmpeg is required for encoding, but was not found on PATH",
            ));
        }

        let mut child = Self::command(cfg).spawn().map_err(|e| {
            MontageError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MontageError::encode("failed to open ffmpeg stdin"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MontageError::encode("failed to open ffmpeg stderr"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.scratch = vec![0u8; cfg.size.byte_len_rgba8()];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg.clone());
        self.last_idx = None;
        Ok(())
    }

    fn is_ready_for_more(&self) -> bool {
        self.stdin.is_some()
    }

    fn wait_until_ready(&mut self) -> MontageResult<()> {
        if self.stdin.is_none() {
            return Err(MontageError::encode("ffmpeg writer is not accepting frames"));
        }
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: FrameRef<'_>) -> MontageResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| MontageError::encode("ffmpeg writer not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(MontageError::encode(
                "ffmpeg writer received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.size() != cfg.size {
            return Err(MontageError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.size.width, cfg.size.height
            )));
        }

        let bg = cfg.background.to_array();
        let bytes: &[u8] = if frame.is_opaque() {
            frame.data
        } else {
            flatten_to_opaque_rgba8(&mut self.scratch, frame.data, frame.premultiplied, bg)?;
            &self.scratch
        };

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(MontageError::encode("ffmpeg writer is already finalized"));
        };
        stdin
            .write_all(bytes)
            .map_err(|e| MontageError::encode(format!("failed to write frame to ffmpeg stdin: {e}")))
    }

    fn end(&mut self) -> MontageResult<()> {
        let (status, stderr_bytes) = self.reap()?;
        if !status.success() {
            return Err(MontageError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        self.cfg = None;
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(child) = self.child.as_mut() {
            let _ = child.kill();
        }
        let _ = self.reap();
        if let Some(cfg) = self.cfg.take()
            && cfg.out_path.exists()
        {
            if let Err(err) = std::fs::remove_file(&cfg.out_path) {
                tracing::warn!(out = %cfg.out_path.display(), %err, "could not remove partial output");
            }
        }
    }
}

impl Drop for FfmpegWriter {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegWriterFactory;

impl WriterFactory for FfmpegWriterFactory {
    fn create(&self) -> MontageResult<Box<dyn VideoWriter>> {
        Ok(Box::new(FfmpegWriter::new()))
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // Rawvideo input rate goes before `-i`.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Second input is the trimmed music; `apad` plus an output `-t` pins audio to the video length.
fn push_audio_args(cmd: &mut Command, audio: &AudioInput, cfg: &WriterConfig) {
    cmd.args(["-ss", &format!("{:.6}", audio.start.as_secs_f64())])
        .args(["-t", &format!("{:.6}", audio.duration.as_secs_f64())])
        .arg("-i")
        .arg(&audio.source)
        .args([
            "-map",
            "0:v:0",
            "-map",
            "1:a:0",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-af",
            "apad",
            "-t",
            &format!("{:.6}", cfg.duration.as_secs_f64()),
            "-movflags",
            "+faststart",
        ]);
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> MontageResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
