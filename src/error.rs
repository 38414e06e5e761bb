//! The fatal error channel (spec.md §7): conditions that stop the pipeline
//! outright rather than becoming a [`Finding`](crate::report::Finding).
//!
//! Grounded on the teacher's `ebook::errors::EbookError`/`FormatError` split
//! via `thiserror`: a small top-level enum that wraps narrower source
//! errors, each `#[error(...)]`-annotated instead of hand-written `Display`
//! impls.

use std::io;
use std::path::PathBuf;

/// Errors that abort validation entirely. Everything that is merely a
/// conformance problem with the EPUB under test is a [`Finding`] with
/// severity [`Severity::Fatal`](crate::catalog::Severity::Fatal), not an
/// `EngineError` — this type is reserved for cases where the engine itself
/// cannot proceed (the archive can't be opened at all, the host filesystem
/// failed, and similar).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to open '{path}': {source}")]
    OpenArchive {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{path}' is not a valid ZIP archive: {source}")]
    InvalidZip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("single-file mode requires a document path, but none was given")]
    MissingSingleFileTarget,

    #[error("the validation pipeline aborted after a fatal finding: {0}")]
    Aborted(&'static str),
}

pub type EngineResult<T> = Result<T, EngineError>;
