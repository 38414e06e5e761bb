//! The `<meta name="viewport" content="...">` parser (spec.md §4.O), used
//! by `HTM-013`/`checks::fixed_layout` to read a fixed-layout spine item's
//! intrinsic dimensions.
//!
//! A standalone, total function with zero dependency on [`archive`](crate::archive),
//! [`report`](crate::report), or [`model`](crate::model) types, exactly as
//! spec.md's Design Notes require, so it can be unit-tested directly
//! against a table of `(input → output | error kind)` without any archive
//! or report fixture. There is no teacher analogue; the algorithm mirrors
//! the EPUB 3.3 viewport meta syntax (tolerant `,`/`;` pair separation,
//! `name=value` tokens, duplicate property names folded with `,`, distinct
//! properties joined with `;`).

use std::fmt;

/// A syntax error in a `viewport` meta's `content` value. Names match
/// spec.md §4.O exactly.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ViewportError {
    NullOrEmpty,
    AssignUnexpected,
    ValueEmpty,
    NameEmpty,
    LeadingSeparator,
    TrailingSeparator,
}

impl fmt::Display for ViewportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NullOrEmpty => "NULL_OR_EMPTY",
            Self::AssignUnexpected => "ASSIGN_UNEXPECTED",
            Self::ValueEmpty => "VALUE_EMPTY",
            Self::NameEmpty => "NAME_EMPTY",
            Self::LeadingSeparator => "LEADING_SEPARATOR",
            Self::TrailingSeparator => "TRAILING_SEPARATOR",
        };
        f.write_str(s)
    }
}

const SEPARATORS: [char; 2] = [',', ';'];

/// Parses a `viewport` meta's `content` attribute value into a normalized
/// form: distinct property names joined with `;`, and (when the same
/// property name appears more than once) its values joined with `,`.
///
/// ```
/// use epub_conform::viewport::parse;
/// assert_eq!(
///     parse("width=device-width, initial-scale=1").unwrap(),
///     "width=device-width;initial-scale=1",
/// );
/// ```
pub fn parse(content: &str) -> Result<String, ViewportError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ViewportError::NullOrEmpty);
    }
    if trimmed.starts_with(SEPARATORS) {
        return Err(ViewportError::LeadingSeparator);
    }
    if trimmed.ends_with(SEPARATORS) {
        return Err(ViewportError::TrailingSeparator);
    }

    let mut properties: Vec<(String, Vec<String>)> = Vec::new();

    for token in trimmed.split(SEPARATORS) {
        let token = token.trim();
        if token.matches('=').count() != 1 {
            return Err(ViewportError::AssignUnexpected);
        }
        let (name, value) = token.split_once('=').expect("exactly one '=' checked above");
        let name = name.trim();
        let value = value.trim();

        if name.is_empty() {
            return Err(ViewportError::NameEmpty);
        }
        if value.is_empty() {
            return Err(ViewportError::ValueEmpty);
        }

        match properties.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, values)) => values.push(value.to_owned()),
            None => properties.push((name.to_owned(), vec![value.to_owned()])),
        }
    }

    Ok(properties
        .into_iter()
        .map(|(name, values)| format!("{name}={}", values.join(",")))
        .collect::<Vec<_>>()
        .join(";"))
}
