//! Cross-reference resolution (spec.md §4.J): after every content document
//! has been parsed, walk the union of their outbound references and
//! resolve each one against the manifest and the referenced document's own
//! id table.
//!
//! Modeled as a single pass over an owned `Vec` of `(path, ContentDocument)`
//! pairs rather than a pointer-linked graph, matching spec.md §9's "avoid
//! parent/back-pointers" guidance; the same arena-over-`Vec` shape
//! `checks::opf::check_fallback_chains` uses for its coloring DFS is reused
//! here for `RSC-008`, over CSS `@import` edges instead of manifest
//! fallback ids (CSS is the one content kind whose references form a
//! document-to-document inclusion graph the checker can walk).

use crate::catalog::CheckId;
use crate::location::Location;
use crate::model::content_doc::ContentDocument;
use crate::model::manifest::Manifest;
use crate::report::Report;
use crate::util::uri;
use std::collections::HashSet;

/// Resolves every content document's outbound references. `opf_path` is
/// included among valid targets since a reference (rare, but legal) may
/// point back at the package document itself.
pub fn check(documents: &[(String, ContentDocument)], manifest: &Manifest, opf_path: &str, report: &mut Report) {
    let mut known_targets: HashSet<&str> = manifest.iter().map(|item| item.href.as_str()).collect();
    known_targets.insert(opf_path);

    for (path, document) in documents {
        let facts = document.facts();
        for reference in &facts.references {
            if reference.remote {
                continue;
            }
            if reference.target_path.starts_with('/') {
                continue;
            }

            if let Some(fragment) = &reference.fragment {
                if uri::is_media_fragment(fragment) {
                    continue;
                }
            }

            if escapes_archive_root(path, &reference.target_path) {
                report.emit(
                    CheckId::Rsc009,
                    Location::path(path.clone()).with_position(reference.position),
                    &[&reference.target_path],
                );
                continue;
            }

            let target_path: &str = if reference.target_path.is_empty() {
                path.as_str()
            } else {
                &reference.target_path
            };

            if !known_targets.contains(target_path) {
                report.emit(
                    CheckId::Rsc001,
                    Location::path(path.clone()).with_position(reference.position),
                    &[target_path],
                );
                continue;
            }

            if let Some(fragment) = &reference.fragment {
                let Some(target_facts) = documents
                    .iter()
                    .find(|(candidate, _)| candidate == target_path)
                    .map(|(_, doc)| doc.facts())
                else {
                    // Target exists in the manifest but was never parsed as a
                    // content document (an image, font, or other binary
                    // resource); such targets have no id table to check a
                    // fragment against.
                    continue;
                };
                if !target_facts.has_id(fragment) {
                    report.emit(
                        CheckId::Rsc006,
                        Location::path(path.clone()).with_position(reference.position),
                        &[target_path, fragment],
                    );
                }
            }
        }
    }

    check_import_cycles(documents, report);
}

/// Whether resolving `relative` against `base_path`'s directory would walk
/// above the archive root via more `..` components than the base path has
/// directory levels to absorb (spec.md `RSC-009`, "cross-publication
/// reference" — by convention a reference that escapes the archive this
/// way is assumed to target a sibling publication's shared resource tree).
fn escapes_archive_root(base_path: &str, relative: &str) -> bool {
    let dir = uri::parent(base_path);
    let mut depth: i32 = if dir.is_empty() { 0 } else { dir.matches('/').count() as i32 + 1 };

    for component in relative.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                depth -= 1;
                if depth < 0 {
                    return true;
                }
            }
            _ => depth += 1,
        }
    }
    false
}

/// `RSC-008`: a circular chain of CSS `@import`s. Built as a coloring DFS
/// over the same documents slice, keyed by path, exactly as
/// `checks::opf::check_fallback_chains` walks the manifest's fallback ids.
fn check_import_cycles(documents: &[(String, ContentDocument)], report: &mut Report) {
    #[derive(Copy, Clone, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let mut colors = vec![Color::White; documents.len()];

    fn visit(index: usize, documents: &[(String, ContentDocument)], colors: &mut [Color], report: &mut Report) {
        if colors[index] == Color::Black {
            return;
        }
        if colors[index] == Color::Gray {
            report.emit(
                CheckId::Rsc008,
                Location::path(documents[index].0.clone()),
                &[&documents[index].0],
            );
            return;
        }
        colors[index] = Color::Gray;

        let ContentDocument::Css(css) = &documents[index].1 else {
            colors[index] = Color::Black;
            return;
        };
        for reference in &css.facts.references {
            if reference.remote || reference.target_path.is_empty() {
                continue;
            }
            if let Some(next) = documents.iter().position(|(path, _)| path == &reference.target_path) {
                visit(next, documents, colors, report);
            }
        }

        colors[index] = Color::Black;
    }

    for index in 0..documents.len() {
        visit(index, documents, &mut colors, report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Position;
    use crate::model::content_doc::{CssDocument, DocumentFacts, Reference, XhtmlDocument};
    use crate::model::manifest::ManifestItem;

    fn manifest_with(items: &[(&str, &str)]) -> Manifest {
        let mut manifest = Manifest::default();
        for (id, href) in items {
            manifest.0.push(ManifestItem {
                id: (*id).to_owned(),
                href: (*href).to_owned(),
                media_type: "application/xhtml+xml".into(),
                fallback: None,
                media_overlay: None,
                properties: Vec::new(),
                position: Position::new(1, 1),
            });
        }
        manifest
    }

    fn xhtml_with_refs(refs: Vec<Reference>) -> ContentDocument {
        ContentDocument::Xhtml(XhtmlDocument {
            facts: DocumentFacts { ids: Vec::new(), references: refs },
            ..Default::default()
        })
    }

    #[test]
    fn missing_target_is_flagged() {
        let documents = vec![(
            "c1.xhtml".to_owned(),
            xhtml_with_refs(vec![Reference {
                target_path: "missing.png".into(),
                fragment: None,
                position: Position::new(1, 1),
                remote: false,
            }]),
        )];
        let manifest = manifest_with(&[("c1", "c1.xhtml")]);
        let mut report = Report::new();
        check(&documents, &manifest, "content.opf", &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Rsc001));
    }

    #[test]
    fn missing_fragment_is_flagged() {
        let target = ContentDocument::Xhtml(XhtmlDocument {
            facts: DocumentFacts { ids: vec![("real".into(), Position::new(2, 1))], references: Vec::new() },
            ..Default::default()
        });
        let documents = vec![
            (
                "c1.xhtml".to_owned(),
                xhtml_with_refs(vec![Reference {
                    target_path: "c2.xhtml".into(),
                    fragment: Some("missing".into()),
                    position: Position::new(1, 1),
                    remote: false,
                }]),
            ),
            ("c2.xhtml".to_owned(), target),
        ];
        let manifest = manifest_with(&[("c1", "c1.xhtml"), ("c2", "c2.xhtml")]);
        let mut report = Report::new();
        check(&documents, &manifest, "content.opf", &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Rsc006));
    }

    #[test]
    fn media_fragment_is_not_treated_as_an_id() {
        let documents = vec![(
            "c1.xhtml".to_owned(),
            xhtml_with_refs(vec![Reference {
                target_path: "clip.mp4".into(),
                fragment: Some("t=10,20".into()),
                position: Position::new(1, 1),
                remote: false,
            }]),
        )];
        let manifest = manifest_with(&[("c1", "c1.xhtml"), ("clip", "clip.mp4")]);
        let mut report = Report::new();
        check(&documents, &manifest, "content.opf", &mut report);

        let finished = report.finish();
        assert!(!finished.findings.iter().any(|f| f.id == CheckId::Rsc006));
    }

    #[test]
    fn path_escaping_archive_root_is_cross_publication() {
        let documents = vec![(
            "text/c1.xhtml".to_owned(),
            xhtml_with_refs(vec![Reference {
                target_path: "../../outside.xhtml".into(),
                fragment: None,
                position: Position::new(1, 1),
                remote: false,
            }]),
        )];
        let manifest = manifest_with(&[("c1", "text/c1.xhtml")]);
        let mut report = Report::new();
        check(&documents, &manifest, "content.opf", &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Rsc009));
    }

    #[test]
    fn circular_css_imports_are_flagged() {
        let css_a = ContentDocument::Css(CssDocument {
            facts: DocumentFacts {
                ids: Vec::new(),
                references: vec![Reference { target_path: "b.css".into(), fragment: None, position: Position::new(1, 1), remote: false }],
            },
            ..Default::default()
        });
        let css_b = ContentDocument::Css(CssDocument {
            facts: DocumentFacts {
                ids: Vec::new(),
                references: vec![Reference { target_path: "a.css".into(), fragment: None, position: Position::new(1, 1), remote: false }],
            },
            ..Default::default()
        });
        let documents = vec![("a.css".to_owned(), css_a), ("b.css".to_owned(), css_b)];
        let manifest = manifest_with(&[("a", "a.css"), ("b", "b.css")]);
        let mut report = Report::new();
        check(&documents, &manifest, "content.opf", &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Rsc008));
    }
}
