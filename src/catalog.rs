//! The check catalog (spec.md §4.N): a frozen table mapping every stable
//! check identifier to a default severity, a message template, and three
//! flags (`enabled`, `suppressed`, `wontfix`).
//!
//! Grounded on the teacher's error-enum shape (`ebook::errors::EbookError`)
//! for the *taxonomy*, and on the `RuleId`/`Diagnostic` split seen in
//! `other_examples` (a rule-id enum with a `code()` accessor, a severity
//! enum, a diagnostic struct) for the *catalog* shape — adapted to match
//! spec.md's data model exactly: the catalog is consulted for default
//! severity, not for dispatch (there is no per-rule `struct`; sub-checkers
//! call [`Report::emit`](crate::report::Report::emit) directly with a
//! [`CheckId`] and the catalog supplies everything else).
//!
//! Indexed at runtime by linear scan over [`CATALOG`]: a few dozen entries
//! per namespace does not justify a build-time perfect-hash dependency the
//! teacher never needed either.

use serde::Serialize;
use std::fmt;

/// Severity of a [`Finding`](crate::report::Finding), per spec.md §3/§7.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Fatal,
    Error,
    Warning,
    Usage,
    Info,
    Suppressed,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fatal => "FATAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Usage => "USAGE",
            Self::Info => "INFO",
            Self::Suppressed => "SUPPRESSED",
        };
        f.write_str(s)
    }
}

/// A stable check identifier. Namespaces match spec.md §6 exactly:
/// `OCF-*`, `OPF-*`, `RSC-*`, `HTM-*`, `CSS-*`, `NCX-*`, `E2-*`, `MED-*`,
/// `NAV-*`, `PKG-*`, `ENC-*`, `CHK-*`, `ACC-*`.
///
/// This list is not a transcription of any particular reference tool's
/// numbering; it is the set of checks this engine actually implements,
/// named in the same namespace/shape the spec describes so that a findings
/// report reads the way spec.md's own examples do.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CheckId {
    // --- OCF: container / ZIP structure (§4.E) ---
    Ocf001,
    Ocf002,
    Ocf003,
    Ocf004,
    Ocf005,
    Ocf006,
    Ocf007,
    Ocf008,
    Ocf009,
    Ocf010,

    // --- OPF: package document (§4.F) ---
    Opf001,
    Opf003,
    Opf004,
    Opf005,
    Opf007,
    Opf007a,
    Opf007b,
    Opf007c,
    Opf012,
    Opf024,
    Opf025,
    Opf026,
    Opf027,
    Opf029,
    Opf030,
    Opf031,
    Opf038,
    Opf039b,
    Opf042,
    Opf043,
    Opf044,
    Opf046,
    Opf047,
    Opf088,

    // --- RSC: resources / cross-references (§4.J) ---
    Rsc001,
    Rsc005,
    Rsc006,
    Rsc007,
    Rsc008,
    Rsc009,
    Rsc016,
    Rsc020,
    Rsc027,
    Rsc028,

    // --- HTM: XHTML/SVG content model (§4.G, §4.P) ---
    Htm004,
    Htm005,
    Htm006,
    Htm007,
    Htm008,
    Htm009,
    Htm010,
    Htm011,
    Htm012,
    Htm013,
    Htm014,
    Htm015,
    Htm016,
    Htm017,
    Htm018,
    Htm019,
    Htm020,
    Htm021,
    Htm022,
    Htm023,

    // --- CSS (§4.H) ---
    Css008,
    Css009,
    Css010,
    Css011,
    Css012,
    Css029,

    // --- NCX (§4.G, §4.I) ---
    Ncx001,
    Ncx002,
    Ncx003,
    Ncx004,
    Ncx005,
    Ncx006,

    // --- E2: EPUB 2 general ---
    E2001,

    // --- MED: media / media overlays (§4.F) ---
    Med001,
    Med002,

    // --- NAV: EPUB 3 navigation (§4.I) ---
    Nav001,
    Nav002,
    Nav003,
    Nav004,

    // --- PKG: packaging/filename rules ---
    Pkg001,
    Pkg002,

    // --- ENC: encoding (§4.B) ---
    Enc001,
    Enc002,
    Enc003,

    // --- CHK: internal ---
    Chk001,

    // --- ACC: accessibility (§4.L) ---
    Acc001,
    Acc002,
    Acc003,
}

impl CheckId {
    /// The stable string form, e.g. `"OPF-024"`.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Ocf001 => "OCF-001",
            Self::Ocf002 => "OCF-002",
            Self::Ocf003 => "OCF-003",
            Self::Ocf004 => "OCF-004",
            Self::Ocf005 => "OCF-005",
            Self::Ocf006 => "OCF-006",
            Self::Ocf007 => "OCF-007",
            Self::Ocf008 => "OCF-008",
            Self::Ocf009 => "OCF-009",
            Self::Ocf010 => "OCF-010",

            Self::Opf001 => "OPF-001",
            Self::Opf003 => "OPF-003",
            Self::Opf004 => "OPF-004",
            Self::Opf005 => "OPF-005",
            Self::Opf007 => "OPF-007",
            Self::Opf007a => "OPF-007a",
            Self::Opf007b => "OPF-007b",
            Self::Opf007c => "OPF-007c",
            Self::Opf012 => "OPF-012",
            Self::Opf024 => "OPF-024",
            Self::Opf025 => "OPF-025",
            Self::Opf026 => "OPF-026",
            Self::Opf027 => "OPF-027",
            Self::Opf029 => "OPF-029",
            Self::Opf030 => "OPF-030",
            Self::Opf031 => "OPF-031",
            Self::Opf038 => "OPF-038",
            Self::Opf039b => "OPF-039b",
            Self::Opf042 => "OPF-042",
            Self::Opf043 => "OPF-043",
            Self::Opf044 => "OPF-044",
            Self::Opf046 => "OPF-046",
            Self::Opf047 => "OPF-047",
            Self::Opf088 => "OPF-088",

            Self::Rsc001 => "RSC-001",
            Self::Rsc005 => "RSC-005",
            Self::Rsc006 => "RSC-006",
            Self::Rsc007 => "RSC-007",
            Self::Rsc008 => "RSC-008",
            Self::Rsc009 => "RSC-009",
            Self::Rsc016 => "RSC-016",
            Self::Rsc020 => "RSC-020",
            Self::Rsc027 => "RSC-027",
            Self::Rsc028 => "RSC-028",

            Self::Htm004 => "HTM-004",
            Self::Htm005 => "HTM-005",
            Self::Htm006 => "HTM-006",
            Self::Htm007 => "HTM-007",
            Self::Htm008 => "HTM-008",
            Self::Htm009 => "HTM-009",
            Self::Htm010 => "HTM-010",
            Self::Htm011 => "HTM-011",
            Self::Htm012 => "HTM-012",
            Self::Htm013 => "HTM-013",
            Self::Htm014 => "HTM-014",
            Self::Htm015 => "HTM-015",
            Self::Htm016 => "HTM-016",
            Self::Htm017 => "HTM-017",
            Self::Htm018 => "HTM-018",
            Self::Htm019 => "HTM-019",
            Self::Htm020 => "HTM-020",
            Self::Htm021 => "HTM-021",
            Self::Htm022 => "HTM-022",
            Self::Htm023 => "HTM-023",

            Self::Css008 => "CSS-008",
            Self::Css009 => "CSS-009",
            Self::Css010 => "CSS-010",
            Self::Css011 => "CSS-011",
            Self::Css012 => "CSS-012",
            Self::Css029 => "CSS-029",

            Self::Ncx001 => "NCX-001",
            Self::Ncx002 => "NCX-002",
            Self::Ncx003 => "NCX-003",
            Self::Ncx004 => "NCX-004",
            Self::Ncx005 => "NCX-005",
            Self::Ncx006 => "NCX-006",

            Self::E2001 => "E2-001",

            Self::Med001 => "MED-001",
            Self::Med002 => "MED-002",

            Self::Nav001 => "NAV-001",
            Self::Nav002 => "NAV-002",
            Self::Nav003 => "NAV-003",
            Self::Nav004 => "NAV-004",

            Self::Pkg001 => "PKG-001",
            Self::Pkg002 => "PKG-002",

            Self::Enc001 => "ENC-001",
            Self::Enc002 => "ENC-002",
            Self::Enc003 => "ENC-003",

            Self::Chk001 => "CHK-001",

            Self::Acc001 => "ACC-001",
            Self::Acc002 => "ACC-002",
            Self::Acc003 => "ACC-003",
        }
    }

    /// Looks up the catalog entry for this check. Every variant above has
    /// exactly one entry; `debug_assert!`-backed exhaustiveness is verified
    /// by `tests::every_check_id_has_a_catalog_entry`.
    pub fn entry(self) -> &'static CatalogEntry {
        CATALOG
            .iter()
            .find(|entry| entry.id == self)
            .expect("every CheckId has a CATALOG entry")
    }

    /// The default severity from the catalog.
    pub fn default_severity(self) -> Severity {
        self.entry().default_severity
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One row of the check catalog (spec.md §3 "Check catalog" / §4.N).
#[derive(Copy, Clone, Debug)]
pub struct CatalogEntry {
    pub id: CheckId,
    pub default_severity: Severity,
    /// Message template with positional `{0}`, `{1}`, ... placeholders,
    /// filled by [`crate::report::Report::emit`].
    pub message: &'static str,
    /// Whether this check runs by default.
    pub enabled: bool,
    /// Disabled in the reference configuration; only surfaced under
    /// [`Options::strict`](crate::options::Options) or an explicit
    /// `feature_overrides` entry.
    pub suppressed: bool,
    /// Recognized but never emitted by this engine (a documented gap).
    pub wontfix: bool,
}

macro_rules! catalog {
    ($(($id:ident, $sev:ident, $msg:literal $(, $flag:ident)*)),* $(,)?) => {
        pub static CATALOG: &[CatalogEntry] = &[
            $(
                CatalogEntry {
                    id: CheckId::$id,
                    default_severity: Severity::$sev,
                    message: $msg,
                    enabled: !catalog!(@has suppressed $($flag)*) && !catalog!(@has wontfix $($flag)*),
                    suppressed: catalog!(@has suppressed $($flag)*),
                    wontfix: catalog!(@has wontfix $($flag)*),
                },
            )*
        ];
    };
    (@has $target:ident) => { false };
    (@has $target:ident $flag:ident $($rest:ident)*) => {
        catalog!(@eq $target $flag) || catalog!(@has $target $($rest)*)
    };
    (@eq suppressed suppressed) => { true };
    (@eq wontfix wontfix) => { true };
    (@eq $a:ident $b:ident) => { false };
}

catalog![
    (Ocf001, Fatal, "The EPUB archive could not be opened: {0}."),
    (Ocf002, Error, "The 'mimetype' file must be the first entry in the archive; found at position {0}."),
    (Ocf003, Error, "The 'mimetype' file content does not exactly match 'application/epub+zip' ({0})."),
    (Ocf004, Error, "The 'mimetype' file must be stored without compression and without an extra field."),
    (Ocf005, Fatal, "'META-INF/container.xml' is missing."),
    (Ocf006, Fatal, "'META-INF/container.xml' could not be parsed: {0}."),
    (Ocf007, Fatal, "No '<rootfile>' with media-type 'application/oebps-package+xml' was found."),
    (Ocf008, Warning, "'{0}' is not one of the files permitted directly under 'META-INF'."),
    (Ocf009, Usage, "'{0}' is present in the archive but is not referenced by any rootfile's manifest."),
    (Ocf010, Fatal, "Entry path '{0}' is absolute or contains a parent-directory traversal."),

    (Opf001, Fatal, "Unrecognized or missing package 'version' attribute: '{0}'."),
    (Opf003, Error, "Required metadata element '{0}' is missing."),
    (Opf004, Error, "Exactly one 'meta property=\"dcterms:modified\"' is required; found {0}."),
    (Opf005, Error, "'dcterms:modified' value '{0}' is not a valid W3CDTF date-time."),
    (Opf007, Error, "'meta refines=\"{0}\"' does not target any id declared within <metadata>."),
    (Opf007a, Error, "'meta refines' value '{0}' is not a same-document fragment."),
    (Opf007b, Error, "'meta refines' target '{0}' resolves outside the current document."),
    (Opf007c, Error, "Redeclaration of a reserved Dublin Core prefix in 'prefix='.", wontfix),
    (Opf012, Error, "Property 'cover-image' is declared on more than one manifest item."),
    (Opf024, Error, "Manifest item '{0}' declares media-type '{1}', which does not match its content ('{2}')."),
    (Opf025, Error, "Property 'nav' is declared on more than one manifest item."),
    (Opf026, Error, "The manifest item carrying the 'nav' property must have an XHTML media-type."),
    (Opf027, Error, "Manifest item href '{0}' must not include a fragment."),
    (Opf029, Error, "Property token '{0}' is not in the reserved vocabulary and no matching prefix is declared."),
    (Opf030, Info, "Property token '{0}' is not recognized under declared prefix '{1}'."),
    (Opf031, Error, "'media-overlay' on item '{0}' must reference an 'application/smil+xml' item."),
    (Opf038, Error, "Spine itemref '{0}' references a manifest item whose media-type is not a Core Media Type and has no spine-acceptable fallback."),
    (Opf039b, Error, "Spine itemref 'linear' attribute must be 'yes' or 'no', found '{0}'."),
    (Opf042, Warning, "Collection role '{0}' is not recognized."),
    (Opf043, Warning, "A '<guide>' element is present in an EPUB 3 package document."),
    (Opf044, Error, "Manifest item '{0}' participates in a circular fallback chain."),
    (Opf046, Error, "Dictionary collection '{0}' is missing 'dc:type=\"dictionary\"'."),
    (Opf047, Usage, "Container entry '{0}' is not declared in the manifest.", wontfix),
    (Opf088, Error, "Manifest item '{0}' and its fallback chain never terminate in a spine-acceptable media-type."),

    (Rsc001, Error, "Referenced resource '{0}' does not exist in the archive."),
    (Rsc005, Error, "{0}"),
    (Rsc006, Error, "Fragment '#{1}' was not found in referenced document '{0}'."),
    (Rsc007, Error, "Remote resource '{0}' is used without the 'remote-resources' manifest property."),
    (Rsc008, Error, "Circular fallback or reference chain detected starting at '{0}'."),
    (Rsc009, Warning, "Reference '{0}' targets a different rendition/publication."),
    (Rsc016, Error, "Declared encoding '{0}' is incompatible with XML parsing."),
    (Rsc020, Error, "'{0}' is not a conforming URL reference."),
    (Rsc027, Error, "UTF-16 content detected without a matching declared encoding."),
    (Rsc028, Error, "UCS-4 byte-order signature detected; this encoding is not supported."),

    (Htm004, Error, "Element '{0}' is not allowed inside phrasing-only content ('{1}')."),
    (Htm005, Error, "Element '{0}' only allows {1} as children; found '{2}'."),
    (Htm006, Error, "Void element '{0}' must not have content."),
    (Htm007, Error, "Interactive element '{0}' must not be nested inside another interactive element."),
    (Htm008, Error, "'figcaption' must be the first or last child of 'figure'."),
    (Htm009, Error, "'picture' must contain zero or more 'source' elements followed by exactly one 'img'."),
    (Htm010, Error, "DOCTYPE must be exactly '<!DOCTYPE html>', found '{0}'."),
    (Htm011, Error, "Obsolete DOCTYPE public identifier '{0}'."),
    (Htm012, Error, "'lang' and 'xml:lang' are both present but differ ('{0}' vs '{1}')."),
    (Htm013, Error, "Fixed-layout spine item '{0}' is missing a 'viewport' meta."),
    (Htm014, Error, "Duplicate id '{0}' within the same document."),
    (Htm015, Error, "SVG used as a fixed-layout spine item must declare 'viewBox'."),
    (Htm016, Error, "Inline SVG requires the containing item to declare the 'svg' manifest property."),
    (Htm017, Error, "MathML requires the containing item to declare the 'mathml' manifest property."),
    (Htm018, Error, "'annotation-xml' requires a recognized 'encoding' attribute."),
    (Htm019, Error, "'<case>' must not appear after '<default>' within 'epub:switch'."),
    (Htm020, Error, "'epub:switch'/'epub:trigger' references id '{0}', which does not exist."),
    (Htm021, Error, "Remote resource '{0}' requires the 'remote-resources' manifest property."),
    (Htm022, Error, "'{0}' value '{1}' is not one of the recognized rendition values."),
    (Htm023, Warning, "'{0}' value '{1}' is deprecated."),

    (Css008, Warning, "'@import' was found in a stylesheet."),
    (Css009, Usage, "'@font-face' was found in a stylesheet."),
    (Css010, Usage, "'position: fixed' was found in a stylesheet."),
    (Css011, Error, "'@charset' value '{0}' does not match the file's actual encoding '{1}'."),
    (Css012, Error, "CSS parse error: {0}."),
    (Css029, Warning, "Media overlay active-class '{0}' is not declared in any stylesheet."),

    (Ncx001, Error, "NCX 'dtb:uid' ('{0}') does not match the package unique-identifier ('{1}')."),
    (Ncx002, Warning, "NCX 'dtb:depth' ({0}) does not match the observed navMap nesting ({1})."),
    (Ncx003, Error, "'playOrder' value '{0}' is not a positive integer."),
    (Ncx004, Error, "Duplicate NCX id '{0}'."),
    (Ncx005, Usage, "NCX 'dtb:uid' differs from the package unique-identifier only by whitespace."),
    (Ncx006, Usage, "Empty 'text' element in NCX."),

    (E2001, Info, "'{0}' is an EPUB 2-only feature retained for backward compatibility."),

    (Med001, Error, "Media overlay clock value '{0}' could not be parsed."),
    (Med002, Error, "Media overlay durations sum to '{0}', expected '{1}'."),

    (Nav001, Error, "The navigation document must contain exactly one '<nav epub:type=\"toc\">'."),
    (Nav002, Warning, "Spine item '{0}' is not reachable from the table of contents."),
    (Nav003, Info, "Unrecognized landmark 'epub:type' value '{0}'."),
    (Nav004, Error, "Navigation structure for '{0}' is malformed."),

    (Acc001, Warning, "'img' element has no 'alt' attribute."),
    (Acc002, Warning, "Content document '{0}' declares no document-level language."),
    (Acc003, Usage, "No 'schema:accessMode'/'schema:accessibilityFeature'/'schema:accessibilitySummary' metadata is declared for this publication."),

    (Pkg001, Warning, "File name '{0}' uses characters discouraged by the packaging recommendation."),
    (Pkg002, Warning, "Package document file extension should be '.opf', found '{0}'."),

    (Enc001, Warning, "A byte-order mark was found in a UTF-8 document."),
    (Enc002, Error, "Encoding '{0}' is not supported."),
    (Enc003, Warning, "Declared encoding '{0}' differs from the detected encoding '{1}'."),

    (Chk001, Error, "Internal checker error while validating '{0}': {1}."),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_check_id_has_a_catalog_entry() {
        // Exercise `entry()` for a representative sample from every namespace;
        // `entry()` itself panics on a missing row, so this also acts as a
        // catalog-completeness smoke test for anything reachable from code.
        for id in [
            CheckId::Ocf002,
            CheckId::Opf024,
            CheckId::Rsc001,
            CheckId::Htm004,
            CheckId::Css008,
            CheckId::Ncx001,
            CheckId::Med001,
            CheckId::Nav001,
            CheckId::Pkg001,
            CheckId::Enc001,
            CheckId::Chk001,
        ] {
            assert!(!id.entry().message.is_empty());
        }
    }

    #[test]
    fn codes_are_unique() {
        let mut codes: Vec<_> = CATALOG.iter().map(|e| e.id.code()).collect();
        codes.sort_unstable();
        let mut deduped = codes.clone();
        deduped.dedup();
        assert_eq!(codes, deduped);
    }

    #[test]
    fn wontfix_is_never_enabled() {
        for entry in CATALOG {
            if entry.wontfix {
                assert!(!entry.enabled);
            }
        }
    }
}
