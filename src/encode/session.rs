use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::{
    encode::writer::VideoWriter,
    foundation::core::FrameIndex,
    foundation::error::{MontageError, MontageResult},
    render::{cpu::LayerRenderer, layers::LayerGraph},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionFailureKind {
    /// The layer graph could not be rendered.
    Render,
    /// The writer rejected a frame.
    Append,
    /// The writer could not finalize the container.
    Finalize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionFailure {
    pub kind: SessionFailureKind,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Waiting,
    Exporting,
    Completed,
    Failed(SessionFailure),
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_) | Self::Cancelled)
    }
}

/// One asynchronous export of a composed scene into an already-started writer.
///
/// Callers start it once with [`export_async`](Self::export_async) and then poll
/// [`status`](Self::status) / [`progress`](Self::progress).
pub trait ExportSession: Send {
    fn export_async(&mut self) -> MontageResult<()>;

    fn status(&self) -> SessionStatus;

    /// Fraction of frames handed to the writer, in `[0, 1]`.
    fn progress(&self) -> f64;

    /// Request a stop at the next frame boundary.
    fn cancel(&self);

    /// Block for up to `timeout` or until the session reaches a terminal status.
    fn wait_timeout(&self, timeout: Duration) -> SessionStatus;
}

struct Shared {
    status: Mutex<SessionStatus>,
    frames_done: AtomicU64,
    cancel: AtomicBool,
}

impl Shared {
    fn set(&self, status: SessionStatus) {
        *self.status.lock().unwrap_or_else(|e| e.into_inner()) = status;
    }

    fn get(&self) -> SessionStatus {
        self.status.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Renders a [`LayerGraph`] on a background thread and streams it into a writer.
pub struct CompositionExportSession {
    graph: Arc<LayerGraph>,
    writer: Option<Box<dyn VideoWriter>>,
    total_frames: u64,
    shared: Arc<Shared>,
    done_tx: Option<Sender<()>>,
    done_rx: Receiver<()>,
    worker: Option<JoinHandle<()>>,
}

impl CompositionExportSession {
    /// `writer` must already have been started with a config matching the graph.
    pub fn new(graph: Arc<LayerGraph>, writer: Box<dyn VideoWriter>) -> Self {
        let (done_tx, done_rx) = crossbeam_channel::bounded(0);
        let total_frames = graph.total_frames();
        Self {
            graph,
            writer: Some(writer),
            total_frames,
            shared: Arc::new(Shared {
                status: Mutex::new(SessionStatus::Waiting),
                frames_done: AtomicU64::new(0),
                cancel: AtomicBool::new(false),
            }),
            done_tx: Some(done_tx),
            done_rx,
            worker: None,
        }
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

impl ExportSession for CompositionExportSession {
    fn export_async(&mut self) -> MontageResult<()> {
        if self.worker.is_some() || self.writer.is_none() {
            return Err(MontageError::encode("export session already started"));
        }
        let renderer = LayerRenderer::new(Arc::clone(&self.graph))?;
        let (Some(writer), Some(done_tx)) = (self.writer.take(), self.done_tx.take()) else {
            return Err(MontageError::encode("export session already started"));
        };
        let shared = Arc::clone(&self.shared);
        let total = self.total_frames;
        shared.set(SessionStatus::Exporting);

        let handle = std::thread::Builder::new()
            .name("montage-session".into())
            .spawn(move || {
                let status = run_session(renderer, writer, total, &shared);
                tracing::debug!(?status, "export session finished");
                shared.set(status);
                drop(done_tx);
            })
            .map_err(|e| MontageError::encode(format!("failed to spawn export session: {e}")))?;
        self.worker = Some(handle);
        Ok(())
    }

    fn status(&self) -> SessionStatus {
        self.shared.get()
    }

    fn progress(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        let done = self.shared.frames_done.load(Ordering::Acquire);
        (done as f64 / self.total_frames as f64).clamp(0.0, 1.0)
    }

    fn cancel(&self) {
        self.shared.cancel.store(true, Ordering::Release);
    }

    fn wait_timeout(&self, timeout: Duration) -> SessionStatus {
        if self.worker.is_none() {
            return self.status();
        }
        // Nothing is ever sent; the worker drops the sender when it finishes.
        if let Err(RecvTimeoutError::Timeout) = self.done_rx.recv_timeout(timeout) {
            tracing::trace!("export session still running");
        }
        self.status()
    }
}

impl Drop for CompositionExportSession {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            writer.abort();
        }
        if let Some(handle) = self.worker.take() {
            self.shared.cancel.store(true, Ordering::Release);
            let _ = handle.join();
        }
    }
}

fn run_session(
    mut renderer: LayerRenderer,
    mut writer: Box<dyn VideoWriter>,
    total: u64,
    shared: &Shared,
) -> SessionStatus {
    fn fail(
        writer: &mut Box<dyn VideoWriter>,
        kind: SessionFailureKind,
        message: String,
    ) -> SessionStatus {
        writer.abort();
        SessionStatus::Failed(SessionFailure { kind, message })
    }

    for idx in 0..total {
        if shared.cancel.load(Ordering::Acquire) {
            writer.abort();
            return SessionStatus::Cancelled;
        }
        let frame = match renderer.render_frame(FrameIndex(idx)) {
            Ok(f) => f,
            Err(e) => return fail(&mut writer, SessionFailureKind::Render, e.to_string()),
        };
        if !writer.is_ready_for_more()
            && let Err(e) = writer.wait_until_ready()
        {
            return fail(&mut writer, SessionFailureKind::Append, e.to_string());
        }
        if let Err(e) = writer.push_frame(FrameIndex(idx), frame.as_frame_ref()) {
            return fail(&mut writer, SessionFailureKind::Append, e.to_string());
        }
        shared.frames_done.store(idx + 1, Ordering::Release);
    }

    match writer.end() {
        Ok(()) => SessionStatus::Completed,
        Err(e) => fail(&mut writer, SessionFailureKind::Finalize, e.to_string()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/session.rs"]
mod tests;
