//! EPUB 2 NCX document parsing and checking (spec.md §4.G, §4.I):
//! `navMap`/`navPoint` nesting, `playOrder`, duplicate ids, empty `text`
//! elements, and `dtb:uid`/`dtb:depth` cross-checks against the package
//! document.
//!
//! Grounded on the teacher's `ebook::epub::parser::toc::ncx` navPoint-stack
//! walk (`push_ncx_root`/`push_ncx_child`/`handle_pop`), simplified from a
//! `navMap`+`pageList` toc-group builder to a flat [`NavPoint`] list plus a
//! running nesting-depth counter, since the validator only needs structure
//! enough to check `dtb:depth` and `playOrder`, not a materialized
//! navigable tree (that is `checks::nav`'s job, reusing these
//! [`NavPoint`]s).

use crate::catalog::CheckId;
use crate::location::Location;
use crate::model::content_doc::{NavPoint, NcxDocument, Reference};
use crate::model::manifest::ManifestItem;
use crate::parser::xml::{XmlEventKind, XmlReader};
use crate::report::Report;
use crate::util::uri;

pub fn check(item: &ManifestItem, bytes: &[u8], report: &mut Report) -> NcxDocument {
    let mut doc = NcxDocument::default();
    let dir = uri::parent(&item.href);
    let mut reader = XmlReader::new(bytes);
    let mut depth_stack: Vec<()> = Vec::new();
    let mut max_depth = 0u32;
    let mut in_text = false;
    let mut current_text = String::new();

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

                if let Some(id) = start.attribute("id") {
                    if doc.facts.has_id(&id) {
                        report.emit(
                            CheckId::Ncx004,
                            Location::path(item.href.clone()).with_position(event.position),
                            &[&id],
                        );
                    }
                    doc.facts.ids.push((id, event.position));
                }

                match local.as_ref() {
                    "meta" => {
                        let name = start.attribute("name").unwrap_or_default();
                        if name == "dtb:uid" {
                            doc.dtb_uid = start.attribute("content");
                        }
                    }
                    "ncx" => {
                        doc.dtb_depth = None; // set below once the attribute is read, if present
                    }
                    "navMap" => {}
                    "navPoint" => {
                        depth_stack.push(());
                        max_depth = max_depth.max(depth_stack.len() as u32);

                        let play_order = start.attribute("playOrder");
                        if let Some(order) = &play_order {
                            let valid = order.parse::<u64>().map(|v| v > 0).unwrap_or(false);
                            if !valid {
                                report.emit(
                                    CheckId::Ncx003,
                                    Location::path(item.href.clone()).with_position(event.position),
                                    &[order],
                                );
                            }
                        }

                        doc.nav_points.push(NavPoint {
                            id: start.attribute("id"),
                            play_order,
                            text: String::new(),
                            depth: depth_stack.len() as u32,
                            position: event.position,
                        });
                    }
                    "text" => {
                        in_text = true;
                        current_text.clear();
                    }
                    "content" => {
                        if let Some(src) = start.attribute("src") {
                            push_reference(item, dir, &src, event.position, &mut doc.facts.references);
                        }
                    }
                    _ => {}
                }

                if start.attribute("name").as_deref() == Some("dtb:depth") {
                    doc.dtb_depth = start.attribute("content");
                }
            }
            XmlEventKind::End(name) => {
                if name == b"navPoint" {
                    depth_stack.pop();
                } else if name == b"text" && in_text {
                    in_text = false;
                    if current_text.trim().is_empty() {
                        report.emit_plain(
                            CheckId::Ncx006,
                            Location::path(item.href.clone()),
                        );
                    }
                    if let Some(last) = doc.nav_points.last_mut() {
                        if last.text.is_empty() {
                            last.text = current_text.clone();
                        }
                    }
                }
            }
            XmlEventKind::Text(text) | XmlEventKind::CData(text) => {
                if in_text {
                    current_text.push_str(&text);
                }
            }
            XmlEventKind::Eof => break,
            _ => {}
        }
    }

    check_depth(&doc, max_depth, item, report);

    doc
}

/// `NCX-002`: the declared `dtb:depth` should equal the deepest observed
/// `navPoint` nesting. Absent `dtb:depth` is not itself an error here;
/// only a *declared, mismatching* value is flagged.
fn check_depth(doc: &NcxDocument, max_depth: u32, item: &ManifestItem, report: &mut Report) {
    let Some(declared) = doc.dtb_depth.as_ref().and_then(|d| d.trim().parse::<u32>().ok()) else {
        return;
    };
    if declared != max_depth {
        report.emit(
            CheckId::Ncx002,
            Location::path(item.href.clone()),
            &[&declared.to_string(), &max_depth.to_string()],
        );
    }
}

/// Cross-checks this NCX's `dtb:uid` against the package document's
/// `unique-identifier` value (spec.md §4.G `NCX-001`/`NCX-005`). Called by
/// the orchestrator once both the OPF and the NCX have been parsed, since
/// neither is available while parsing the other.
pub fn check_dtb_uid(doc: &NcxDocument, package_identifier: Option<&str>, item: &ManifestItem, report: &mut Report) {
    let (Some(uid), Some(identifier)) = (&doc.dtb_uid, package_identifier) else {
        return;
    };
    if uid == identifier {
        return;
    }
    if uid.trim() == identifier.trim() {
        report.emit(
            CheckId::Ncx005,
            Location::path(item.href.clone()),
            &[uid, identifier],
        );
    } else {
        report.emit(
            CheckId::Ncx001,
            Location::path(item.href.clone()),
            &[uid, identifier],
        );
    }
}

fn push_reference(item: &ManifestItem, dir: &str, raw: &str, position: crate::location::Position, references: &mut Vec<Reference>) {
    let _ = item;
    if raw.is_empty() {
        return;
    }
    if uri::has_scheme(raw) {
        references.push(Reference { target_path: raw.to_owned(), fragment: None, position, remote: true });
        return;
    }
    let resolved = uri::resolve(dir, raw);
    let decoded = uri::decode(&resolved);
    let path = uri::path(&decoded).to_owned();
    let fragment = uri::fragment(&decoded).map(str::to_owned);
    references.push(Reference { target_path: path, fragment, position, remote: false });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(href: &str) -> ManifestItem {
        ManifestItem {
            id: "ncx".into(),
            href: href.into(),
            media_type: "application/x-dtbncx+xml".into(),
            fallback: None,
            media_overlay: None,
            properties: Vec::new(),
            position: crate::location::Position::new(1, 1),
        }
    }

    #[test]
    fn tracks_nav_point_nesting_depth() {
        let xml = br#"<ncx><navMap>
            <navPoint id="n1" playOrder="1"><navLabel><text>One</text></navLabel><content src="c1.xhtml"/>
                <navPoint id="n2" playOrder="2"><navLabel><text>Two</text></navLabel><content src="c2.xhtml"/></navPoint>
            </navPoint>
        </navMap></ncx>"#;
        let item = item("toc.ncx");
        let mut report = Report::new();
        let doc = check(&item, xml, &mut report);

        assert_eq!(doc.nav_points.len(), 2);
        assert_eq!(doc.nav_points[0].depth, 1);
        assert_eq!(doc.nav_points[1].depth, 2);
    }

    #[test]
    fn negative_play_order_is_flagged() {
        let xml = br#"<ncx><navMap>
            <navPoint id="n1" playOrder="-1"><navLabel><text>One</text></navLabel><content src="c1.xhtml"/></navPoint>
        </navMap></ncx>"#;
        let item = item("toc.ncx");
        let mut report = Report::new();
        check(&item, xml, &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Ncx003));
    }

    #[test]
    fn empty_text_is_flagged() {
        let xml = br#"<ncx><navMap>
            <navPoint id="n1" playOrder="1"><navLabel><text></text></navLabel><content src="c1.xhtml"/></navPoint>
        </navMap></ncx>"#;
        let item = item("toc.ncx");
        let mut report = Report::new();
        check(&item, xml, &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Ncx006));
    }

    #[test]
    fn dtb_uid_mismatch_by_whitespace_only_is_usage() {
        let mut doc = NcxDocument::default();
        doc.dtb_uid = Some(" urn:isbn:123 ".to_owned());
        let item = item("toc.ncx");
        let mut report = Report::new();
        check_dtb_uid(&doc, Some("urn:isbn:123"), &item, &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Ncx005));
        assert!(!finished.findings.iter().any(|f| f.id == CheckId::Ncx001));
    }

    #[test]
    fn dtb_uid_real_mismatch_is_error() {
        let mut doc = NcxDocument::default();
        doc.dtb_uid = Some("urn:isbn:999".to_owned());
        let item = item("toc.ncx");
        let mut report = Report::new();
        check_dtb_uid(&doc, Some("urn:isbn:123"), &item, &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Ncx001));
    }
}
