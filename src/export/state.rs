use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::foundation::error::ExportErrorKind;

/// Lifecycle of one export job.
///
/// `Idle -> Preparing -> Encoding -> {Finished | Failed}`. `Failed` is also reachable from
/// `Idle` and `Preparing`; nothing leaves a terminal state.
#[derive(Clone, Debug, PartialEq)]
pub enum JobState {
    Idle,
    Preparing,
    Encoding { progress: f64 },
    Finished { output: PathBuf },
    Failed { error: ExportErrorKind },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. } | Self::Failed { .. })
    }

    pub fn can_transition_to(&self, next: &JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Idle, Preparing)
                | (Idle, Failed { .. })
                | (Preparing, Encoding { .. })
                | (Preparing, Failed { .. })
                | (Encoding { .. }, Encoding { .. })
                | (Encoding { .. }, Finished { .. })
                | (Encoding { .. }, Failed { .. })
        )
    }

    fn same_phase(&self, other: &JobState) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Debug)]
struct Inner {
    current: JobState,
    history: Vec<JobState>,
}

/// Shared, lock-protected job state plus the sequence of phases it went through.
#[derive(Clone, Debug)]
pub(crate) struct StateCell(Arc<Mutex<Inner>>);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(Arc::new(Mutex::new(Inner {
            current: JobState::Idle,
            history: vec![JobState::Idle],
        })))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn get(&self) -> JobState {
        self.lock().current.clone()
    }

    pub(crate) fn history(&self) -> Vec<JobState> {
        self.lock().history.clone()
    }

    /// Apply `next` if the machine allows it. Returns whether the state changed.
    pub(crate) fn transition(&self, next: JobState) -> bool {
        let mut inner = self.lock();
        if !inner.current.can_transition_to(&next) {
            tracing::warn!(from = ?inner.current, to = ?next, "rejected job state transition");
            return false;
        }
        if !inner.current.same_phase(&next) {
            inner.history.push(next.clone());
        }
        inner.current = next;
        true
    }

    /// Raise the encoding progress; lower values are ignored.
    pub(crate) fn set_progress(&self, progress: f64) {
        let mut inner = self.lock();
        if let JobState::Encoding { progress: p } = &mut inner.current
            && progress > *p
        {
            *p = progress;
        }
    }
}
