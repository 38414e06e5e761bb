//! Per-format content-document checkers (spec.md §4.G): one sub-module per
//! tagged [`ContentDocument`](crate::model::content_doc::ContentDocument)
//! variant. The orchestrator dispatches on a manifest item's effective
//! media-type to pick which of these to call; each returns the parsed
//! facts [`checks::xref`](crate::checks::xref) and
//! [`checks::nav`](crate::checks::nav) need once every document has been
//! visited.

pub mod ncx;
pub mod smil;
pub mod svg;
pub mod xhtml;
