use std::io;
use std::path::PathBuf;

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors surfaced while reading bytes out of an [`Archive`](super::Archive).
/// Most of these become [`Finding`](crate::report::Finding)s rather than
/// propagating (the orchestrator converts a missing entry into `RSC-001`,
/// for instance); only [`ArchiveError::Unreadable`] indicates the archive
/// itself could not be opened, which the orchestrator surfaces as an
/// [`EngineError`](crate::error::EngineError).
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("entry '{path}' was not found in the archive")]
    NotFound { path: String },

    #[error("entry '{path}' could not be read: {source}")]
    Io { path: String, source: io::Error },

    #[error("entry '{path}' is not valid UTF-8: {source}")]
    InvalidUtf8 {
        path: String,
        source: std::string::FromUtf8Error,
    },

    #[error("the archive at '{path:?}' could not be opened: {source}")]
    Unreadable {
        path: Option<PathBuf>,
        source: io::Error,
    },

    #[error("'{path}' escapes the archive root")]
    PathTraversal { path: String },
}
