//! Where a [`Finding`](crate::report::Finding) was detected.

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// A position within a document's source text, as reported by the XML
/// parser adapter (`parser::xml`) or, for archive/structural findings, left
/// unset.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in UTF-8 bytes of the decoded line).
    pub column: u32,
}

impl Position {
    pub(crate) const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The location of a [`Finding`](crate::report::Finding): the entry path
/// (relative to the archive root) plus, when known, a position and a short
/// human-readable context string (e.g. the offending element name or
/// attribute value).
///
/// Ordering matches spec.md §5: by `path`, then by `position`, with entries
/// lacking a position sorting before entries that carry one (they are
/// presumed to have been found first, during an earlier pass).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Location {
    pub path: Cow<'static, str>,
    pub position: Option<Position>,
    pub context: Option<Cow<'static, str>>,
}

impl Location {
    /// A finding not attributable to any specific file (e.g. "the archive
    /// could not be opened at all").
    pub fn root() -> Self {
        Self {
            path: Cow::Borrowed(""),
            position: None,
            context: None,
        }
    }

    pub fn path(path: impl Into<Cow<'static, str>>) -> Self {
        Self {
            path: path.into(),
            position: None,
            context: None,
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<Cow<'static, str>>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.path
            .cmp(&other.path)
            .then_with(|| self.position.cmp(&other.position))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        if let Some(position) = self.position {
            write!(f, ":{position}")?;
        }
        if let Some(context) = &self.context {
            write!(f, " ({context})")?;
        }
        Ok(())
    }
}
