//! XHTML content-document parsing and checking (spec.md §4.G): content
//! model (Tier 1/2), DOCTYPE, `lang`/`xml:lang`, duplicate ids, SVG/MathML
//! property requirements, scripted content, `epub:switch`, and outbound
//! references.
//!
//! A single pass over the document: the element stack doubles as both the
//! parser's structural context and the content-model checker's ancestor
//! chain, so nothing here builds a full DOM before checking it.

use crate::catalog::CheckId;
use crate::checks::content_model;
use crate::location::{Location, Position};
use crate::model::content_doc::{Reference, XhtmlDocument};
use crate::model::manifest::ManifestItem;
use crate::parser::xml::{XmlEventKind, XmlReader, XmlStartElement};
use crate::report::Report;
use crate::util::uri;

struct Frame {
    name: String,
    position: Position,
    had_content: bool,
    in_switch: bool,
    saw_default: bool,
    children: Vec<String>,
}

const RECOGNIZED_ANNOTATION_ENCODINGS: &[&str] = &[
    "application/mathml-presentation+xml",
    "application/mathml-content+xml",
    "application/mathml+xml",
    "mathml-presentation",
    "mathml-content",
    "sre",
];

/// Parses and checks one XHTML content document, returning the facts
/// [`checks::xref`](crate::checks::xref) and [`checks::nav`](crate::checks::nav)
/// need afterward.
pub fn check(item: &ManifestItem, bytes: &[u8], report: &mut Report) -> XhtmlDocument {
    let mut doc = XhtmlDocument::default();
    let dir = uri::parent(&item.href);
    let mut reader = XmlReader::new(bytes);
    let mut stack: Vec<Frame> = Vec::new();
    let mut switch_refs: Vec<(String, Position)> = Vec::new();
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
            XmlEventKind::DocType(text) => check_doctype(&text, item, event.position, report, &mut doc),
            XmlEventKind::Start(start) => {
                let local = start.local_name_str().into_owned();

                if !seen_root {
                    seen_root = true;
                    doc.lang = start.attribute("lang");
                    doc.xml_lang = start.attribute("xml:lang");
                    if let (Some(lang), Some(xml_lang)) = (&doc.lang, &doc.xml_lang) {
                        if !lang.eq_ignore_ascii_case(xml_lang) {
                            report.emit(
                                CheckId::Htm012,
                                Location::path(item.href.clone()).with_position(event.position),
                                &[lang, xml_lang],
                            );
                        }
                    }
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

                check_content_model(&local, &stack, item, event.position, report);

                handle_semantic(&start, &local, item, event.position, &mut doc, report);

                collect_references(&start, item, dir, event.position, &mut doc.facts.references, report);

                if let Some(parent) = stack.last_mut() {
                    parent.children.push(local.clone());
                    parent.had_content = true;
                }

                let in_switch = start.name() == b"epub:switch";
                if local == "case" || local == "default" {
                    if let Some(parent) = stack.last_mut() {
                        if parent.in_switch {
                            if local == "case" && parent.saw_default {
                                doc.switch_violations.push(event.position);
                                report.emit_plain(
                                    CheckId::Htm019,
                                    Location::path(item.href.clone()).with_position(event.position),
                                );
                            }
                            if local == "default" {
                                parent.saw_default = true;
                            }
                        }
                    }
                }
                if start.name() == b"epub:trigger" {
                    if let Some(reference) = start.attribute("ref").and_then(|r| r.strip_prefix('#').map(str::to_owned)) {
                        switch_refs.push((reference, event.position));
                    }
                }

                if !start.is_self_closing() {
                    stack.push(Frame {
                        name: local,
                        position: event.position,
                        had_content: false,
                        in_switch,
                        saw_default: false,
                        children: Vec::new(),
                    });
                }
            }
            XmlEventKind::End(_) => {
                if let Some(frame) = stack.pop() {
                    if content_model::is_void(&frame.name) && frame.had_content {
                        report.emit(
                            CheckId::Htm006,
                            Location::path(item.href.clone()).with_position(frame.position),
                            &[&frame.name],
                        );
                    }
                    if frame.name == "figure" {
                        check_figure_structure(&frame, item, report);
                    }
                    if frame.name == "picture" {
                        check_picture_structure(&frame, item, report);
                    }
                    if let Some(parent) = stack.last_mut() {
                        parent.had_content = true;
                    }
                }
            }
            XmlEventKind::Text(text) | XmlEventKind::CData(text) => {
                if !text.trim().is_empty() {
                    if let Some(parent) = stack.last_mut() {
                        parent.had_content = true;
                    }
                }
            }
            XmlEventKind::Eof => break,
        }
    }

    for (id, position) in switch_refs {
        if !doc.facts.has_id(&id) {
            report.emit(
                CheckId::Htm020,
                Location::path(item.href.clone()).with_position(position),
                &[&id],
            );
        }
    }

    doc
}

fn check_doctype(text: &str, item: &ManifestItem, position: Position, report: &mut Report, doc: &mut XhtmlDocument) {
    doc.doctype = Some(text.to_owned());
    let normalized = text.trim();
    if normalized.eq_ignore_ascii_case("html") {
        return;
    }
    if normalized.to_ascii_uppercase().contains("-//W3C//DTD XHTML") {
        report.emit(
            CheckId::Htm011,
            Location::path(item.href.clone()).with_position(position),
            &[normalized],
        );
        return;
    }
    report.emit(
        CheckId::Htm010,
        Location::path(item.href.clone()).with_position(position),
        &[normalized],
    );
}

fn check_content_model(
    local: &str,
    stack: &[Frame],
    item: &ManifestItem,
    position: Position,
    report: &mut Report,
) {
    if content_model::is_block(local) {
        if let Some(ancestor) = nearest_restrictive_ancestor(stack) {
            report.emit(
                CheckId::Htm004,
                Location::path(item.href.clone()).with_position(position),
                &[local, ancestor],
            );
        }
    }

    if let Some(parent) = stack.last() {
        if let Some(allowed) = content_model::restricted_children(&parent.name) {
            if !allowed.contains(&local) {
                report.emit(
                    CheckId::Htm005,
                    Location::path(item.href.clone()).with_position(position),
                    &[&parent.name, &allowed.join("/"), local],
                );
            }
        }
    }

    if content_model::is_interactive(local) {
        if let Some(ancestor) = stack.iter().rev().find(|f| content_model::is_interactive(&f.name) || content_model::is_transparent(&f.name)) {
            if content_model::is_interactive(&ancestor.name) {
                report.emit(
                    CheckId::Htm007,
                    Location::path(item.href.clone()).with_position(position),
                    &[local],
                );
            }
        }
    }
}

/// Walks up the stack, skipping transparent elements, for the nearest
/// ancestor whose content model restricts its children to phrasing
/// content. Returns that ancestor's name if found.
fn nearest_restrictive_ancestor<'a>(stack: &'a [Frame]) -> Option<&'a str> {
    for frame in stack.iter().rev() {
        if content_model::is_transparent(&frame.name) {
            continue;
        }
        if content_model::is_phrasing_only_parent(&frame.name) {
            return Some(&frame.name);
        }
        return None;
    }
    None
}

fn check_figure_structure(frame: &Frame, item: &ManifestItem, report: &mut Report) {
    let Some(caption_index) = frame.children.iter().position(|c| c == "figcaption") else {
        return;
    };
    if caption_index != 0 && caption_index != frame.children.len() - 1 {
        report.emit_plain(
            CheckId::Htm008,
            Location::path(item.href.clone()).with_position(frame.position),
        );
    }
}

fn check_picture_structure(frame: &Frame, item: &ManifestItem, report: &mut Report) {
    let img_count = frame.children.iter().filter(|c| c.as_str() == "img").count();
    let last_is_img = frame.children.last().map(String::as_str) == Some("img");
    let rest_are_sources = frame.children[..frame.children.len().saturating_sub(1)]
        .iter()
        .all(|c| c == "source");

    if img_count != 1 || !last_is_img || !rest_are_sources {
        report.emit_plain(
            CheckId::Htm009,
            Location::path(item.href.clone()).with_position(frame.position),
        );
    }
}

fn handle_semantic(
    start: &XmlStartElement<'_>,
    local: &str,
    item: &ManifestItem,
    position: Position,
    doc: &mut XhtmlDocument,
    report: &mut Report,
) {
    match local {
        "meta" if start.attribute("name").as_deref() == Some("viewport") => {
            doc.viewport_content = start.attribute("content");
        }
        "script" => {
            let script_type = start.attribute("type").unwrap_or_default();
            if script_type.is_empty()
                || script_type.eq_ignore_ascii_case("text/javascript")
                || script_type.eq_ignore_ascii_case("application/javascript")
                || script_type.eq_ignore_ascii_case("module")
            {
                doc.uses_scripted_content = true;
            }
        }
        "img" => {
            if start.attribute("alt").is_none() {
                doc.images_missing_alt.push(position);
            }
        }
        "svg" => {
            if !doc.uses_inline_svg {
                doc.uses_inline_svg = true;
                if !item.has_property("svg") {
                    report.emit_plain(CheckId::Htm016, Location::path(item.href.clone()).with_position(position));
                }
            }
        }
        "math" => {
            if !doc.uses_mathml {
                doc.uses_mathml = true;
                if !item.has_property("mathml") {
                    report.emit_plain(CheckId::Htm017, Location::path(item.href.clone()).with_position(position));
                }
            }
        }
        "annotation-xml" => {
            let encoding = start.attribute("encoding");
            let recognized = encoding
                .as_deref()
                .is_some_and(|value| RECOGNIZED_ANNOTATION_ENCODINGS.iter().any(|e| e.eq_ignore_ascii_case(value)));
            if !recognized {
                report.emit_plain(
                    CheckId::Htm018,
                    Location::path(item.href.clone()).with_position(position),
                );
            }
        }
        _ => {}
    }
}

/// Resolves every `href`/`src` attribute on `start` into an outbound
/// [`Reference`], skipping absolute-path (`/...`) hrefs (spec.md §4.J: these
/// represent embedded web content, not a publication-relative resource) and
/// flagging scheme-qualified hrefs as remote for `checks::xref` to police
/// against the `remote-resources` manifest property.
fn collect_references(
    start: &XmlStartElement<'_>,
    item: &ManifestItem,
    dir: &str,
    position: Position,
    references: &mut Vec<Reference>,
    report: &mut Report,
) {
    for attr_name in ["href", "src", "poster"] {
        let Some(raw) = start.attribute(attr_name) else { continue };
        if raw.is_empty() || raw.starts_with('/') {
            continue;
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
            continue;
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Position as Pos;

    fn item(href: &str, properties: &[&str]) -> ManifestItem {
        ManifestItem {
            id: "c1".into(),
            href: href.into(),
            media_type: "application/xhtml+xml".into(),
            fallback: None,
            media_overlay: None,
            properties: properties.iter().map(|p| p.to_string()).collect(),
            position: Pos::new(1, 1),
        }
    }

    #[test]
    fn flags_block_element_inside_phrasing_parent() {
        let xml = br#"<html><body><p><center>Hello</center></p></body></html>"#;
        let item = item("c1.xhtml", &[]);
        let mut report = Report::new();
        check(&item, xml, &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Htm004));
    }

    #[test]
    fn flags_inline_svg_without_declared_property() {
        let xml = br#"<html><body><svg viewBox="0 0 10 10"></svg></body></html>"#;
        let item = item("c1.xhtml", &[]);
        let mut report = Report::new();
        let doc = check(&item, xml, &mut report);

        assert!(doc.uses_inline_svg);
        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Htm016));
    }

    #[test]
    fn inline_svg_with_declared_property_is_silent() {
        let xml = br#"<html><body><svg viewBox="0 0 10 10"></svg></body></html>"#;
        let item = item("c1.xhtml", &["svg"]);
        let mut report = Report::new();
        check(&item, xml, &mut report);

        let finished = report.finish();
        assert!(!finished.findings.iter().any(|f| f.id == CheckId::Htm016));
    }

    #[test]
    fn duplicate_ids_are_flagged() {
        let xml = br#"<html><body><p id="x">a</p><p id="x">b</p></body></html>"#;
        let item = item("c1.xhtml", &[]);
        let mut report = Report::new();
        check(&item, xml, &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Htm014));
    }

    #[test]
    fn void_element_with_content_is_flagged() {
        let xml = b"<html><body><br>not empty</br></body></html>";
        let item = item("c1.xhtml", &[]);
        let mut report = Report::new();
        check(&item, xml, &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Htm006));
    }

    #[test]
    fn switch_case_after_default_is_flagged() {
        let xml = br#"<html><body><epub:switch>
            <epub:default><p>fallback</p></epub:default>
            <epub:case required-namespace="http://www.w3.org/1998/Math/MathML"><p>math</p></epub:case>
        </epub:switch></body></html>"#;
        let item = item("c1.xhtml", &[]);
        let mut report = Report::new();
        check(&item, xml, &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Htm019));
    }

    #[test]
    fn well_formed_document_resolves_relative_href() {
        let xml = br#"<html><body><a href="chapter2.xhtml#start">Next</a></body></html>"#;
        let item = item("text/c1.xhtml", &[]);
        let mut report = Report::new();
        let doc = check(&item, xml, &mut report);

        assert_eq!(doc.facts.references.len(), 1);
        assert_eq!(doc.facts.references[0].target_path, "text/chapter2.xhtml");
        assert_eq!(doc.facts.references[0].fragment.as_deref(), Some("start"));
    }
}
