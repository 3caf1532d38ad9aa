use std::path::Path;

use crate::{encode::ffmpeg::ensure_parent_dir, foundation::error::ExportError};

/// Make `path` writable: parent created, any existing file removed.
pub(crate) fn prepare_output(path: &Path) -> Result<(), ExportError> {
    if path.as_os_str().is_empty() {
        return Err(ExportError::output_dir("output path is empty"));
    }
    if path.is_dir() {
        return Err(ExportError::output_dir(format!(
            "output path '{}' is a directory",
            path.display()
        )));
    }
    ensure_parent_dir(path).map_err(ExportError::output_dir)?;
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(out = %path.display(), "removed existing output");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ExportError::output_dir(format!(
            "could not replace '{}': {e}",
            path.display()
        ))),
    }
}

/// Remove whatever a failed or cancelled export left behind.
pub(crate) fn discard_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(out = %path.display(), "discarded partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(out = %path.display(), %e, "could not discard partial output"),
    }
}
