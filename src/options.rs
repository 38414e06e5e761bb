//! Validation run configuration (spec.md §4.M, §7 "no globals").
//!
//! Grounded on the teacher's `EpubReaderSettings`/`EpubReaderSettingsBuilder`
//! pair (`ebook::epub::reader`): a plain settings struct plus a builder
//! that wraps it, built with [`Options::builder`] and consumed by the
//! orchestrator. There is exactly one `Options` value per validation run;
//! nothing here is read from a process-wide static.

use crate::catalog::{CheckId, Severity};

/// Settings for a single validation run, passed to
/// [`validate`](crate::validate) / [`validate_path`](crate::validate_path).
///
/// Create an instance via [`Options::builder`] or [`Options::default`].
#[non_exhaustive]
#[derive(Clone, Debug, Default)]
pub struct Options {
    /// Promotes every `USAGE`/`INFO` finding normally left out of
    /// conformance accounting into the strict accounting path: suppressed
    /// checks are re-enabled at their catalog default severity.
    ///
    /// Default: `false`
    pub strict: bool,

    /// Validates a single content document directly rather than a full
    /// EPUB archive. Container/package-level checks (`OCF-*`, most
    /// `OPF-*`) do not run; spec.md's single-file-mode remap table
    /// applies (`OPF-001/031/038/039b/042/088` and `HTM-004/009` all
    /// surface as `RSC-005`, since there is no package document to
    /// attribute the original, more specific check to).
    ///
    /// Default: `false`
    pub single_file_mode: bool,

    /// Per-check severity overrides. A check may only be made *stricter*
    /// than its catalog default (spec.md §7); an entry here requesting a
    /// looser severity is ignored by [`Report::set_override`](crate::report::Report).
    ///
    /// Default: empty
    pub feature_overrides: Vec<(CheckId, Severity)>,
}

impl Options {
    /// Returns a builder to create an [`Options`] instance.
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder(Options::default())
    }
}

impl From<OptionsBuilder> for Options {
    fn from(builder: OptionsBuilder) -> Self {
        builder.build()
    }
}

/// Builder to construct an [`Options`] instance.
///
/// # Examples
/// ```
/// # use epub_conform::options::Options;
/// # use epub_conform::catalog::{CheckId, Severity};
/// let options = Options::builder()
///     .strict(true)
///     .feature_override(CheckId::Ocf009, Severity::Error)
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct OptionsBuilder(Options);

impl OptionsBuilder {
    /// Turns this builder into an [`Options`] instance.
    pub fn build(self) -> Options {
        self.0
    }

    /// See [`Options::strict`].
    pub fn strict(mut self, strict: bool) -> Self {
        self.0.strict = strict;
        self
    }

    /// See [`Options::single_file_mode`].
    pub fn single_file_mode(mut self, single_file_mode: bool) -> Self {
        self.0.single_file_mode = single_file_mode;
        self
    }

    /// Appends one severity override. See [`Options::feature_overrides`].
    pub fn feature_override(mut self, id: CheckId, severity: Severity) -> Self {
        self.0.feature_overrides.push((id, severity));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_plain_default() {
        let built = Options::builder().build();
        let default = Options::default();
        assert_eq!(built.strict, default.strict);
        assert_eq!(built.single_file_mode, default.single_file_mode);
        assert!(built.feature_overrides.is_empty());
    }

    #[test]
    fn builder_accumulates_overrides() {
        let options = Options::builder()
            .feature_override(CheckId::Ocf009, Severity::Error)
            .feature_override(CheckId::Opf042, Severity::Error)
            .build();
        assert_eq!(options.feature_overrides.len(), 2);
    }
}
