//! XML parsing and byte-level encoding detection (spec.md §4.B, §4.C).
//!
//! Grounded on the teacher's `parser::xml` module (the `quick-xml`
//! pull-parser adapter: `XmlReader`/`XmlEvent`/`XmlStartElement`/
//! `XmlAttributes`), narrowed from a text-content-building reader (the
//! teacher consolidates runs of text/CData/general-refs into rendered
//! paragraphs for an end user) to a position-tracking structural reader:
//! every event here additionally carries the byte offset it started at, so
//! a checker can turn it into a [`Location`](crate::location::Position) for
//! a finding. Malformed XML is not fatal to the whole run; `next()` returns
//! a [`ParserError`] for the offending event and the caller decides whether
//! to keep scanning (content-document checks do; the fatal OCF/OPF
//! well-formedness gates do not).

pub mod encoding;
pub mod xml;

pub use xml::{XmlAttributes, XmlEvent, XmlReader, XmlStartElement};

/// Errors surfaced while pulling one XML event. These are not
/// [`EngineError`](crate::error::EngineError)s: a malformed document is a
/// conformance finding (typically `RSC-005`, "the resource could not be
/// parsed"), not an engine failure.
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("malformed XML at byte {offset}: {source}")]
    Malformed {
        offset: usize,
        #[source]
        source: quick_xml::Error,
    },
    #[error("invalid UTF-8 at byte {offset}")]
    InvalidUtf8 { offset: usize },
}

pub type ParserResult<T> = Result<T, ParserError>;
