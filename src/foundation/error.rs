pub type MontageResult<T> = Result<T, MontageError>;

#[derive(thiserror::Error, Debug)]
pub enum MontageError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("media error: {0}")]
    Media(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MontageError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

/// Fieldless tag for [`ExportError`], convenient for matching and assertions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportErrorKind {
    Media,
    Render,
    OutputDir,
    VideoWriter,
    AppendToBuffer,
    Cancelled,
}

/// Terminal failure of an export job.
///
/// Every variant carries a human-readable detail; the variant itself is the stable contract.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum ExportError {
    /// The input set was empty or nothing in it could be placed on the timeline.
    #[error("media error: {0}")]
    Media(String),

    /// Reserved for renderer failures that are not tied to the writer.
    #[error("render error: {0}")]
    Render(String),

    /// The output location could not be prepared.
    #[error("output directory error: {0}")]
    OutputDir(String),

    /// The encoder or export session failed to initialize, start or finalize.
    #[error("video writer error: {0}")]
    VideoWriter(String),

    /// A frame could not be appended mid-encode.
    #[error("append to buffer error: {0}")]
    AppendToBuffer(String),

    /// The job was cancelled between frames.
    #[error("export cancelled")]
    Cancelled,
}

impl ExportError {
    pub fn kind(&self) -> ExportErrorKind {
        match self {
            Self::Media(_) => ExportErrorKind::Media,
            Self::Render(_) => ExportErrorKind::Render,
            Self::OutputDir(_) => ExportErrorKind::OutputDir,
            Self::VideoWriter(_) => ExportErrorKind::VideoWriter,
            Self::AppendToBuffer(_) => ExportErrorKind::AppendToBuffer,
            Self::Cancelled => ExportErrorKind::Cancelled,
        }
    }

    pub(crate) fn media(err: impl std::fmt::Display) -> Self {
        Self::Media(err.to_string())
    }

    pub(crate) fn render(err: impl std::fmt::Display) -> Self {
        Self::Render(err.to_string())
    }

    pub(crate) fn output_dir(err: impl std::fmt::Display) -> Self {
        Self::OutputDir(err.to_string())
    }

    pub(crate) fn video_writer(err: impl std::fmt::Display) -> Self {
        Self::VideoWriter(err.to_string())
    }

    pub(crate) fn append(err: impl std::fmt::Display) -> Self {
        Self::AppendToBuffer(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
