#![warn(missing_docs)]
//! # epub-conform
//! - Repository: <https://github.com/DevinSterling/rbook>
//!
//! A validation engine for the EPUB 2.0.1 and 3.3 specifications. Given an
//! EPUB archive (zipped or as an unpacked directory), this crate parses the
//! container, the package document, and every content document reachable
//! from the spine and manifest, then reports conformance findings tagged
//! with stable [check identifiers](catalog::CheckId).
//!
//! This crate checks; it does not edit, render, or repackage. Producing a
//! conforming EPUB, rendering one, or fixing one up automatically are all
//! out of scope — see [`SPEC_FULL.md`](https://github.com/DevinSterling/rbook)
//! for the full boundary.
//!
//! # Modules
//!
//! | Module                       | Overview                                                              |
//! |-------------------------------|------------------------------------------------------------------------|
//! | [`archive`]                  | Abstracts over a zipped or directory-based EPUB for byte-level access. |
//! | [`parser`]                   | Position-tracking XML adapter and encoding sniffer.                   |
//! | [`model`]                    | Parsed container/package/content-document data.                      |
//! | [`checks`]                   | One sub-module per check family (`ocf`, `opf`, `content`, `css`, ...). |
//! | [`catalog`]                  | The check catalog: id, default severity, message template, flags.     |
//! | [`report`]                   | The append-only finding accumulator and its deterministic ordering.   |
//! | [`orchestrator`]             | Drives the full validation pipeline end to end.                       |
//! | [`viewport`]                 | The standalone fixed-layout `viewport` meta parser.                   |
//! | [`options`]                  | Per-run configuration (strictness, single-file mode, overrides).      |
//!
//! # Validating an EPUB
//! ```no_run
//! use epub_conform::options::Options;
//!
//! let report = epub_conform::validate_path("book.epub", Options::default()).unwrap();
//! if !report.is_conforming() {
//!     for finding in &report.findings {
//!         println!("{} {} {}", finding.severity, finding.id, finding.location);
//!     }
//! }
//! ```
//!
//! Validation never fails merely because the EPUB under test is
//! non-conforming: that is reported, not returned as an [`Err`]. The
//! [`Err`](error::EngineError) path is reserved for conditions the engine
//! itself cannot recover from, such as the archive failing to open at all.

pub mod archive;
pub mod catalog;
pub mod checks;
pub mod error;
pub mod location;
pub mod model;
pub mod options;
pub mod orchestrator;
pub mod parser;
pub mod report;
pub mod viewport;
mod util;

use crate::error::EngineResult;
use crate::options::Options;
use crate::report::FinishedReport;
use std::io::{Read, Seek};
use std::path::Path;

/// Validates the EPUB archive at `path`, which may be a `.epub` file or a
/// directory containing an unpacked EPUB.
pub fn validate_path(path: impl AsRef<Path>, options: Options) -> EngineResult<FinishedReport> {
    orchestrator::run_path(path.as_ref(), options)
}

/// Validates an EPUB archive already available as a [`Read`] + [`Seek`]
/// stream (a ZIP byte stream; there is no directory-mode equivalent for an
/// in-memory source). `R` must be [`Send`] and `'static` since the engine
/// boxes the underlying `zip::ZipArchive<R>` as a `dyn Archive`, which is
/// itself `Send + Sync`.
pub fn validate<R: Read + Seek + Send + 'static>(reader: R, options: Options) -> EngineResult<FinishedReport> {
    orchestrator::run_zip(reader, options)
}
