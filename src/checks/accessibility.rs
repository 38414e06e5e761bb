//! Accessibility-metadata and content checks (spec.md §4.L): `alt` text on
//! images, a document-level language declaration per content document, and
//! publication-level `schema:accessMode`/`schema:accessibilityFeature`/
//! `schema:accessibilitySummary` metadata.
//!
//! Content-level checks (`ACC-001`/`ACC-002`) walk the already-parsed
//! [`ContentDocument`]s the same way [`checks::fixed_layout`](crate::checks::fixed_layout)
//! and [`checks::xref`](crate::checks::xref) do, rather than re-parsing;
//! the publication-level check (`ACC-003`) reads `<metadata>` directly,
//! the same "find by property" lookup `checks::fixed_layout::publication_value`
//! uses for rendition properties.

use crate::catalog::CheckId;
use crate::location::Location;
use crate::model::content_doc::ContentDocument;
use crate::model::metadata::Metadata;
use crate::report::Report;

const ACCESSIBILITY_PROPERTIES: &[&str] =
    &["schema:accessMode", "schema:accessibilityFeature", "schema:accessibilitySummary"];

/// Runs every accessibility check over the fully-parsed publication.
/// `documents` pairs each content document with its manifest-relative path.
pub fn check(documents: &[(String, ContentDocument)], metadata: &Metadata, report: &mut Report) {
    for (path, document) in documents {
        check_document(path, document, report);
    }
    check_publication_metadata(metadata, report);
}

fn check_document(path: &str, document: &ContentDocument, report: &mut Report) {
    let ContentDocument::Xhtml(xhtml) = document else { return };

    for position in &xhtml.images_missing_alt {
        report.emit(
            CheckId::Acc001,
            Location::path(path.to_owned()).with_position(*position),
            &[],
        );
    }

    if xhtml.lang.is_none() && xhtml.xml_lang.is_none() {
        report.emit(CheckId::Acc002, Location::path(path.to_owned()), &[path]);
    }
}

fn check_publication_metadata(metadata: &Metadata, report: &mut Report) {
    let declared = metadata
        .meta
        .iter()
        .any(|meta| ACCESSIBILITY_PROPERTIES.contains(&meta.property.as_str()));
    if !declared {
        report.emit_plain(CheckId::Acc003, Location::root());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Position;
    use crate::model::content_doc::{DocumentFacts, XhtmlDocument};
    use crate::model::metadata::Meta;

    fn xhtml_doc(lang: Option<&str>, images_missing_alt: Vec<Position>) -> ContentDocument {
        ContentDocument::Xhtml(XhtmlDocument {
            facts: DocumentFacts::default(),
            lang: lang.map(str::to_owned),
            images_missing_alt,
            ..Default::default()
        })
    }

    #[test]
    fn image_without_alt_is_flagged() {
        let documents = vec![(
            "c1.xhtml".to_owned(),
            xhtml_doc(Some("en"), vec![Position::new(3, 1)]),
        )];
        let mut report = Report::new();
        check(&documents, &Metadata::default(), &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Acc001));
    }

    #[test]
    fn image_with_alt_is_silent() {
        let documents = vec![("c1.xhtml".to_owned(), xhtml_doc(Some("en"), Vec::new()))];
        let mut report = Report::new();
        check(&documents, &Metadata::default(), &mut report);

        let finished = report.finish();
        assert!(!finished.findings.iter().any(|f| f.id == CheckId::Acc001));
    }

    #[test]
    fn missing_document_language_is_flagged() {
        let documents = vec![("c1.xhtml".to_owned(), xhtml_doc(None, Vec::new()))];
        let mut report = Report::new();
        check(&documents, &Metadata::default(), &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Acc002));
    }

    #[test]
    fn missing_accessibility_metadata_is_flagged() {
        let mut report = Report::new();
        check(&[], &Metadata::default(), &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Acc003));
    }

    #[test]
    fn declared_accessibility_metadata_is_silent() {
        let mut metadata = Metadata::default();
        metadata.meta.push(Meta {
            id: None,
            property: "schema:accessMode".into(),
            value: "visual".into(),
            refines: None,
            scheme: None,
            position: Position::new(1, 1),
        });
        let mut report = Report::new();
        check(&[], &metadata, &mut report);

        let finished = report.finish();
        assert!(!finished.findings.iter().any(|f| f.id == CheckId::Acc003));
    }
}
