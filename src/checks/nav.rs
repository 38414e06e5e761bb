//! Navigation checking (spec.md §4.I): the EPUB 3 nav document's `toc`,
//! `landmarks`, and `page-list` navs, and EPUB 2 NCX `navPoint` structure.
//!
//! The EPUB 3 half walks `<nav>`/`<ol>`/`<li>`/`<a>` with the same
//! push-on-`Start`/pop-on-`End` stack the teacher's `TocParser` uses for
//! its `parse_epub3_nav` (`examples/DevinSterling-rbook/src/ebook/epub/
//! parser/toc/xhtml.rs`), simplified to a flat link list per nav rather
//! than a materialized `TocGroups` tree, since this checker only needs
//! reachability and vocabulary, not a navigable table of contents. The
//! EPUB 2 half is mostly already done by the time this runs: `checks::
//! content::ncx` tracks `navPoint` nesting and `playOrder` as it parses,
//! so this module only adds the one thing that needs the spine in hand.

use crate::catalog::CheckId;
use crate::location::Location;
use crate::model::content_doc::NcxDocument;
use crate::model::manifest::Manifest;
use crate::model::spine::Spine;
use crate::parser::xml::{XmlEventKind, XmlReader};
use crate::report::Report;
use crate::util::uri;

const LANDMARK_VOCABULARY: &[&str] = &[
    "cover", "titlepage", "frontmatter", "bodymatter", "backmatter", "toc", "loa", "loi", "lot",
    "lov", "appendix", "glossary", "bibliography", "preface", "foreword", "epigraph",
    "acknowledgments", "colophon", "index", "dedication", "notes", "volume", "part", "chapter",
    "subchapter", "landmarks", "page-list",
];

#[derive(Default)]
struct NavLink {
    target_path: String,
    epub_type: Option<String>,
}

#[derive(Default)]
struct Nav {
    epub_type: String,
    links: Vec<NavLink>,
    malformed: bool,
}

/// Parses and checks the EPUB 3 nav document (spec.md `NAV-001`–`NAV-004`).
/// `dir` is the nav document's own archive-relative directory, used to
/// resolve every `<a href>` the same way content-document checkers resolve
/// their own outbound references.
pub fn check_epub3_nav(href: &str, bytes: &[u8], spine: &Spine, manifest: &Manifest, report: &mut Report) {
    let dir = uri::parent(href);
    let navs = parse_navs(href, bytes, dir, report);

    let toc_navs: Vec<&Nav> = navs.iter().filter(|nav| has_type(&nav.epub_type, "toc")).collect();
    match toc_navs.len() {
        1 => {}
        _ => report.emit_plain(CheckId::Nav001, Location::path(href.to_owned())),
    }

    if let Some(toc) = toc_navs.first() {
        check_reachability(href, toc, spine, manifest, report);
    }

    for nav in &navs {
        if nav.malformed {
            report.emit(
                CheckId::Nav004,
                Location::path(href.to_owned()),
                &[&nav.epub_type],
            );
        }
        if has_type(&nav.epub_type, "landmarks") {
            for link in &nav.links {
                let Some(kind) = &link.epub_type else { continue };
                for token in kind.split_whitespace() {
                    if !LANDMARK_VOCABULARY.contains(&token) {
                        report.emit(
                            CheckId::Nav003,
                            Location::path(href.to_owned()),
                            &[token],
                        );
                    }
                }
            }
        }
    }
}

fn has_type(epub_type: &str, needle: &str) -> bool {
    epub_type.split_whitespace().any(|token| token == needle)
}

/// Every linear spine item must be reachable by following some chain of
/// `<a href>`s from the toc nav (spec.md `NAV-002`); since this checker
/// only needs reachability, not order, a flat set membership test over the
/// toc's collected links suffices.
fn check_reachability(nav_href: &str, toc: &Nav, spine: &Spine, manifest: &Manifest, report: &mut Report) {
    let reachable: std::collections::HashSet<&str> =
        toc.links.iter().map(|link| link.target_path.as_str()).collect();

    for itemref in &spine.items {
        if !itemref.is_linear() {
            continue;
        }
        let Some(item) = manifest.0.by_key(itemref.idref.as_str()) else { continue };
        if !reachable.contains(item.href.as_str()) {
            report.emit(
                CheckId::Nav002,
                Location::path(nav_href.to_owned()).with_position(itemref.position),
                &[&item.href],
            );
        }
    }
}

fn parse_navs(href: &str, bytes: &[u8], dir: &str, report: &mut Report) -> Vec<Nav> {
    let mut reader = XmlReader::new(bytes);
    let mut navs = Vec::new();
    let mut nav_depth: Vec<usize> = Vec::new(); // element-nesting-depth at which each open nav started
    let mut depth = 0usize;

    loop {
        let Some(event) = reader.next() else { break };
        let event = match event {
            Ok(event) => event,
            Err(_) => {
                report.emit(
                    CheckId::Rsc005,
                    Location::path(href.to_owned()),
                    &["the navigation document is not well-formed XML"],
                );
                break;
            }
        };

        match event.kind {
            XmlEventKind::Start(start) => {
                let local = start.local_name_str();
                match local.as_ref() {
                    "nav" => {
                        let epub_type = start.attribute("epub:type").unwrap_or_default();
                        navs.push(Nav { epub_type, links: Vec::new(), malformed: false });
                        nav_depth.push(depth);
                    }
                    "a" => {
                        if let Some(current) = navs.last_mut() {
                            let href_raw = start.attribute("href");
                            let epub_type = start.attribute("epub:type");
                            match href_raw {
                                Some(raw) if !raw.is_empty() => {
                                    let resolved = uri::resolve(dir, &raw);
                                    let decoded = uri::decode(&resolved);
                                    let path = uri::path(&decoded).to_owned();
                                    current.links.push(NavLink { target_path: path, epub_type });
                                }
                                _ => current.malformed = true,
                            }
                        }
                    }
                    _ => {}
                }
                if !start.is_self_closing() {
                    depth += 1;
                }
            }
            XmlEventKind::End(name) => {
                depth = depth.saturating_sub(1);
                if name == b"nav" {
                    if nav_depth.last() == Some(&depth) {
                        nav_depth.pop();
                    }
                }
            }
            XmlEventKind::Eof => break,
            _ => {}
        }
    }

    navs
}

/// EPUB 2: beyond the nesting/`playOrder`/duplicate-id checks already
/// performed while parsing (`checks::content::ncx`), nothing further needs
/// the spine in hand, so this is a thin pass-through kept for symmetry
/// with the EPUB 3 entry point and as the orchestrator's single call site
/// for "check navigation" regardless of version.
pub fn check_epub2_ncx(_doc: &NcxDocument, _spine: &Spine, _report: &mut Report) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Position;
    use crate::model::manifest::ManifestItem;
    use crate::model::spine::SpineItemRef;

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

    fn spine_with(idrefs: &[&str]) -> Spine {
        Spine {
            toc: None,
            page_progression_direction: None,
            items: idrefs
                .iter()
                .map(|idref| SpineItemRef {
                    idref: (*idref).to_owned(),
                    linear: None,
                    properties: Vec::new(),
                    position: Position::new(1, 1),
                })
                .collect(),
        }
    }

    #[test]
    fn single_toc_nav_with_full_coverage_is_clean() {
        let xml = br#"<html><body><nav epub:type="toc"><ol>
            <li><a href="c1.xhtml">One</a></li>
            <li><a href="c2.xhtml">Two</a></li>
        </ol></nav></body></html>"#;
        let manifest = manifest_with(&[("c1", "c1.xhtml"), ("c2", "c2.xhtml")]);
        let spine = spine_with(&["c1", "c2"]);
        let mut report = Report::new();
        check_epub3_nav("nav.xhtml", xml, &spine, &manifest, &mut report);

        let finished = report.finish();
        assert!(!finished.findings.iter().any(|f| f.id == CheckId::Nav001));
        assert!(!finished.findings.iter().any(|f| f.id == CheckId::Nav002));
    }

    #[test]
    fn missing_toc_nav_is_flagged() {
        let xml = br#"<html><body><nav epub:type="landmarks"><ol></ol></nav></body></html>"#;
        let manifest = manifest_with(&[]);
        let spine = spine_with(&[]);
        let mut report = Report::new();
        check_epub3_nav("nav.xhtml", xml, &spine, &manifest, &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Nav001));
    }

    #[test]
    fn unreachable_spine_item_is_flagged() {
        let xml = br#"<html><body><nav epub:type="toc"><ol>
            <li><a href="c1.xhtml">One</a></li>
        </ol></nav></body></html>"#;
        let manifest = manifest_with(&[("c1", "c1.xhtml"), ("c2", "c2.xhtml")]);
        let spine = spine_with(&["c1", "c2"]);
        let mut report = Report::new();
        check_epub3_nav("nav.xhtml", xml, &spine, &manifest, &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Nav002));
    }

    #[test]
    fn unknown_landmark_type_is_info() {
        let xml = br#"<html><body>
            <nav epub:type="toc"><ol><li><a href="c1.xhtml">One</a></li></ol></nav>
            <nav epub:type="landmarks"><ol>
                <li><a epub:type="bogus-kind" href="c1.xhtml">Start</a></li>
            </ol></nav>
        </body></html>"#;
        let manifest = manifest_with(&[("c1", "c1.xhtml")]);
        let spine = spine_with(&["c1"]);
        let mut report = Report::new();
        check_epub3_nav("nav.xhtml", xml, &spine, &manifest, &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Nav003));
    }

    #[test]
    fn anchor_without_href_is_malformed() {
        let xml = br#"<html><body><nav epub:type="toc"><ol>
            <li><a>Missing href</a></li>
        </ol></nav></body></html>"#;
        let manifest = manifest_with(&[]);
        let spine = spine_with(&[]);
        let mut report = Report::new();
        check_epub3_nav("nav.xhtml", xml, &spine, &manifest, &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Nav004));
    }
}
