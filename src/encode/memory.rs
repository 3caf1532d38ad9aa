use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    encode::writer::{VideoWriter, WriterConfig, WriterFactory},
    foundation::core::FrameIndex,
    foundation::error::{MontageError, MontageResult},
    render::frame::{FrameRGBA, FrameRef},
};

/// Behavior knobs for [`InMemoryWriter`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryWriterOpts {
    /// Report "not ready" after this many frames until `wait_until_ready` is called.
    pub burst: Option<u32>,
    /// Fail `push_frame` for this index.
    pub fail_on_frame: Option<u64>,
    pub fail_on_begin: bool,
    pub fail_on_end: bool,
    /// Keep copies of every frame (memory heavy).
    pub keep_frames: bool,
    /// Write a small marker file at the output path on `end`.
    pub write_marker: bool,
}

/// What a writer saw; shared with the test that created it.
#[derive(Debug, Default)]
pub struct WriterRecording {
    pub config: Option<WriterConfig>,
    pub output_existed_at_begin: bool,
    pub indices: Vec<FrameIndex>,
    pub frames: Vec<FrameRGBA>,
    pub wait_calls: u64,
    pub not_ready_polls: u64,
    pub ended: bool,
    pub aborted: bool,
}

/// Writer that records frames in memory. For tests and debugging.
#[derive(Debug)]
pub struct InMemoryWriter {
    opts: InMemoryWriterOpts,
    rec: Arc<Mutex<WriterRecording>>,
    started: bool,
    since_ready: u32,
}

impl InMemoryWriter {
    pub fn new(opts: InMemoryWriterOpts) -> Self {
        Self {
            opts,
            rec: Arc::default(),
            started: false,
            since_ready: 0,
        }
    }

    pub fn recording(&self) -> Arc<Mutex<WriterRecording>> {
        Arc::clone(&self.rec)
    }

    fn rec(&self) -> MutexGuard<'_, WriterRecording> {
        self.rec.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl VideoWriter for InMemoryWriter {
    fn begin(&mut self, cfg: &WriterConfig) -> MontageResult<()> {
        cfg.validate()?;
        if self.opts.fail_on_begin {
            return Err(MontageError::encode("in-memory writer refused to start"));
        }
        let mut rec = self.rec();
        rec.output_existed_at_begin = cfg.out_path.exists();
        rec.config = Some(cfg.clone());
        drop(rec);
        self.started = true;
        self.since_ready = 0;
        Ok(())
    }

    fn is_ready_for_more(&self) -> bool {
        if !self.started {
            return false;
        }
        let ready = self.opts.burst.is_none_or(|n| self.since_ready < n);
        if !ready {
            self.rec().not_ready_polls += 1;
        }
        ready
    }

    fn wait_until_ready(&mut self) -> MontageResult<()> {
        if !self.started {
            return Err(MontageError::encode("in-memory writer not started"));
        }
        self.since_ready = 0;
        self.rec().wait_calls += 1;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: FrameRef<'_>) -> MontageResult<()> {
        if !self.started {
            return Err(MontageError::encode("in-memory writer not started"));
        }
        if self.opts.fail_on_frame == Some(idx.0) {
            return Err(MontageError::encode(format!(
                "in-memory writer rejected frame {}",
                idx.0
            )));
        }
        let keep = self.opts.keep_frames;
        let mut rec = self.rec();
        if let Some(cfg) = &rec.config
            && frame.size() != cfg.size
        {
            return Err(MontageError::validation("frame size mismatch"));
        }
        if rec.indices.last().is_some_and(|last| idx <= *last) {
            return Err(MontageError::encode("out-of-order frame index"));
        }
        rec.indices.push(idx);
        if keep {
            rec.frames.push(frame.to_owned_frame());
        }
        drop(rec);
        self.since_ready = self.since_ready.saturating_add(1);
        Ok(())
    }

    fn end(&mut self) -> MontageResult<()> {
        if !self.started {
            return Err(MontageError::encode("in-memory writer not started"));
        }
        self.started = false;
        if self.opts.fail_on_end {
            return Err(MontageError::encode("in-memory writer failed to finalize"));
        }
        let mut rec = self.rec();
        rec.ended = true;
        if self.opts.write_marker
            && let Some(cfg) = &rec.config
        {
            let marker = format!("montage frames={}\n", rec.indices.len());
            std::fs::write(&cfg.out_path, marker).map_err(|e| {
                MontageError::encode(format!(
                    "failed to write '{}': {e}",
                    cfg.out_path.display()
                ))
            })?;
        }
        Ok(())
    }

    fn abort(&mut self) {
        self.started = false;
        self.rec().aborted = true;
    }
}

/// Hands out [`InMemoryWriter`]s and keeps their recordings.
#[derive(Debug, Default)]
pub struct InMemoryWriterFactory {
    opts: InMemoryWriterOpts,
    created: Mutex<Vec<Arc<Mutex<WriterRecording>>>>,
}

impl InMemoryWriterFactory {
    pub fn new(opts: InMemoryWriterOpts) -> Self {
        Self {
            opts,
            created: Mutex::default(),
        }
    }

    /// Number of writers created so far.
    pub fn created(&self) -> usize {
        self.created.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn recordings(&self) -> Vec<Arc<Mutex<WriterRecording>>> {
        self.created
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

impl WriterFactory for InMemoryWriterFactory {
    fn create(&self) -> MontageResult<Box<dyn VideoWriter>> {
        let writer = InMemoryWriter::new(self.opts.clone());
        self.created
            .lock()
            .map_err(|_| MontageError::encode("writer factory lock poisoned"))?
            .push(writer.recording());
        Ok(Box::new(writer))
    }
}
