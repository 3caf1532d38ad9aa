use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::export::state::StateCell;

/// Called with each new progress value, from the export worker thread.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Highest value reported while encoding; `1.0` is reserved for `Finished`.
pub(crate) const ENCODING_CEILING: f64 = 0.99;

/// Fans progress out to the job state, a channel and an optional callback.
///
/// Values are clamped to `[0, ENCODING_CEILING]` and never go backwards.
pub(crate) struct ProgressReporter {
    tx: Sender<f64>,
    callback: Option<ProgressCallback>,
    state: StateCell,
    last: Option<f64>,
}

impl ProgressReporter {
    pub(crate) fn new(tx: Sender<f64>, callback: Option<ProgressCallback>, state: StateCell) -> Self {
        Self {
            tx,
            callback,
            state,
            last: None,
        }
    }

    pub(crate) fn report(&mut self, fraction: f64) {
        let value = if fraction.is_finite() {
            fraction.clamp(0.0, ENCODING_CEILING)
        } else {
            0.0
        };
        if self.last.is_some_and(|last| value <= last) {
            return;
        }
        self.last = Some(value);
        self.state.set_progress(value);
        self.emit(value);
    }

    /// Report completion. Only the job calls this, after `Finished` is set.
    pub(crate) fn finish(&mut self) {
        self.last = Some(1.0);
        self.emit(1.0);
    }

    fn emit(&self, value: f64) {
        // A dropped receiver only means nobody is listening.
        let _ = self.tx.send(value);
        if let Some(cb) = &self.callback {
            cb(value);
        }
    }
}
