//! Standalone SVG content-document parsing and checking (spec.md §4.G):
//! `viewBox` presence (consulted by [`checks::fixed_layout`] for `HTM-015`),
//! duplicate ids, and outbound references (`xlink:href`/`href`).
//!
//! SVG's content model is not otherwise validated here: spec.md §4.G scopes
//! Tier 1/2 content-model checking to XHTML; an SVG document standing alone
//! as a spine item only needs its ids and references collected.

use crate::catalog::CheckId;
use crate::location::Location;
use crate::model::content_doc::{Reference, SvgDocument};
use crate::model::manifest::ManifestItem;
use crate::parser::xml::{XmlEventKind, XmlReader, XmlStartElement};
use crate::report::Report;
use crate::util::uri;

pub fn check(item: &ManifestItem, bytes: &[u8], report: &mut Report) -> SvgDocument {
    let mut doc = SvgDocument::default();
    let dir = uri::parent(&item.href);
    let mut reader = XmlReader::new(bytes);
    let mut seen_root = false;

    loop {
        let Some(event) = reader.next() else { break };
        let event = match event {
            Ok(event) => event,
            Err(_) => {
                report.emit(
                    CheckId::Rsc005,
                    Location::path(item.href.clone()),
                    &["the document is not well-formed XML"],
                );
                break;
            }
        };

        match event.kind {
            XmlEventKind::Start(start) => {
                let local = start.local_name_str();

                if !seen_root && local == "svg" {
                    seen_root = true;
                    doc.has_view_box = start.has_attribute("viewBox");
                }

                if let Some(id) = start.attribute("id") {
                    if doc.facts.has_id(&id) {
                        report.emit(
                            CheckId::Htm014,
                            Location::path(item.href.clone()).with_position(event.position),
                            &[&id],
                        );
                    }
                    doc.facts.ids.push((id, event.position));
                }

                collect_references(&start, item, dir, event.position, &mut doc.facts.references, report);
            }
            XmlEventKind::Eof => break,
            _ => {}
        }
    }

    doc
}

/// Resolves `href`/`xlink:href` attributes the same way the XHTML checker
/// resolves `href`/`src` (spec.md §4.J): scheme-qualified targets are
/// flagged as remote resources requiring the `remote-resources` manifest
/// property, everything else is resolved against this document's own
/// directory.
fn collect_references(
    start: &XmlStartElement<'_>,
    item: &ManifestItem,
    dir: &str,
    position: crate::location::Position,
    references: &mut Vec<Reference>,
    report: &mut Report,
) {
    let raw = start
        .attribute("href")
        .or_else(|| start.attribute("xlink:href"));
    let Some(raw) = raw else { return };
    if raw.is_empty() || raw.starts_with('/') {
        return;
    }

    if uri::has_scheme(&raw) {
        let scheme = uri::scheme(&raw).unwrap_or_default();
        if scheme != "mailto" && scheme != "data" {
            if !item.has_property("remote-resources") {
                report.emit(
                    CheckId::Htm021,
                    Location::path(item.href.clone()).with_position(position),
                    &[&raw],
                );
            }
            references.push(Reference {
                target_path: raw.clone(),
                fragment: None,
                position,
                remote: true,
            });
        }
        return;
    }

    let resolved = uri::resolve(dir, &raw);
    let decoded = uri::decode(&resolved);
    let path = uri::path(&decoded).to_owned();
    let fragment = uri::fragment(&decoded).map(str::to_owned);
    references.push(Reference {
        target_path: path,
        fragment,
        position,
        remote: false,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Position as Pos;

    fn item(href: &str, properties: &[&str]) -> ManifestItem {
        ManifestItem {
            id: "s1".into(),
            href: href.into(),
            media_type: "image/svg+xml".into(),
            fallback: None,
            media_overlay: None,
            properties: properties.iter().map(|p| p.to_string()).collect(),
            position: Pos::new(1, 1),
        }
    }

    #[test]
    fn detects_view_box_on_root() {
        let xml = br#"<svg viewBox="0 0 100 100"><rect id="r1"/></svg>"#;
        let item = item("images/a.svg", &[]);
        let mut report = Report::new();
        let doc = check(&item, xml, &mut report);

        assert!(doc.has_view_box);
        assert!(doc.facts.has_id("r1"));
    }

    #[test]
    fn missing_view_box_is_recorded() {
        let xml = br#"<svg><rect/></svg>"#;
        let item = item("images/a.svg", &[]);
        let mut report = Report::new();
        let doc = check(&item, xml, &mut report);

        assert!(!doc.has_view_box);
    }

    #[test]
    fn remote_xlink_href_without_property_is_flagged() {
        let xml = br#"<svg><image xlink:href="http://example.com/a.png"/></svg>"#;
        let item = item("images/a.svg", &[]);
        let mut report = Report::new();
        check(&item, xml, &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Htm021));
    }

    #[test]
    fn relative_href_resolves_against_document_directory() {
        let xml = br#"<svg><use href="sprites.svg#icon"/></svg>"#;
        let item = item("images/a.svg", &[]);
        let mut report = Report::new();
        let doc = check(&item, xml, &mut report);

        assert_eq!(doc.facts.references.len(), 1);
        assert_eq!(doc.facts.references[0].target_path, "images/sprites.svg");
        assert_eq!(doc.facts.references[0].fragment.as_deref(), Some("icon"));
    }
}
