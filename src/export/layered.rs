use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::{
    encode::{
        session::{CompositionExportSession, ExportSession, SessionFailureKind, SessionStatus},
        writer::VideoWriter,
    },
    export::progress::ProgressReporter,
    foundation::error::ExportError,
    render::layers::LayerGraph,
};

/// Hand the graph to a composition session and poll it until it settles.
///
/// The session owns `writer` from here on and releases it on every exit.
#[tracing::instrument(level = "debug", skip_all, fields(frames = graph.total_frames()))]
pub(crate) fn run_layered(
    graph: Arc<LayerGraph>,
    writer: Box<dyn VideoWriter>,
    cancel: &AtomicBool,
    progress: &mut ProgressReporter,
    poll_interval: Duration,
) -> Result<u64, ExportError> {
    let mut session = CompositionExportSession::new(graph, writer);
    let frames = session.total_frames();
    session.export_async().map_err(ExportError::video_writer)?;

    let mut cancel_sent = false;
    loop {
        if !cancel_sent && cancel.load(Ordering::Acquire) {
            session.cancel();
            cancel_sent = true;
        }
        match session.wait_timeout(poll_interval) {
            SessionStatus::Waiting | SessionStatus::Exporting => progress.report(session.progress()),
            SessionStatus::Completed => return Ok(frames),
            SessionStatus::Cancelled => return Err(ExportError::Cancelled),
            SessionStatus::Failed(failure) => {
                return Err(match failure.kind {
                    SessionFailureKind::Render => ExportError::Render(failure.message),
                    SessionFailureKind::Append => ExportError::AppendToBuffer(failure.message),
                    SessionFailureKind::Finalize => ExportError::VideoWriter(failure.message),
                });
            }
        }
    }
}
