//! SMIL media-overlay document parsing and checking (spec.md §4.G): `par`/
//! `seq` structure, `text`/`audio` clip collection, and clock-value parsing.
//!
//! Duration summation against a spine item's declared `media:duration`
//! (`MED-002`) happens once all of an XHTML item's overlay documents have
//! been parsed, so it is exposed here as [`total_seconds`] for the
//! orchestrator to call rather than performed inline.

use crate::catalog::CheckId;
use crate::location::{Location, Position};
use crate::model::content_doc::{Reference, SmilClip, SmilDocument};
use crate::model::manifest::ManifestItem;
use crate::parser::xml::{XmlEventKind, XmlReader, XmlStartElement};
use crate::report::Report;
use crate::util::uri;

pub fn check(item: &ManifestItem, bytes: &[u8], report: &mut Report) -> SmilDocument {
    let mut doc = SmilDocument::default();
    let dir = uri::parent(&item.href);
    let mut reader = XmlReader::new(bytes);
    let mut container_stack: Vec<String> = Vec::new();

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
                let local = start.local_name_str().into_owned();

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

                match local.as_str() {
                    "seq" | "par" => {
                        if local == "par" {
                            check_par_structure(&mut reader, &start, item, dir, event.position, &mut doc, report);
                        }
                    }
                    "text" => {
                        let src = start.attribute("src").unwrap_or_default();
                        push_reference(item, dir, &src, event.position, &mut doc.facts.references);
                    }
                    "audio" => {
                        let src = start.attribute("src").unwrap_or_default();
                        push_reference(item, dir, &src, event.position, &mut doc.facts.references);
                    }
                    _ => {}
                }

                if !start.is_self_closing() {
                    container_stack.push(local);
                }
            }
            XmlEventKind::End(_) => {
                container_stack.pop();
            }
            XmlEventKind::Eof => break,
            _ => {}
        }
    }

    doc
}

/// A `<par>` is expected to contain at most one `<text>` and at most one
/// `<audio>` child; the audio child's `clipBegin`/`clipEnd` (if present) are
/// parsed as SMIL clock values (`MED-001`) and recorded as a [`SmilClip`].
fn check_par_structure(
    reader: &mut XmlReader<'_>,
    par: &XmlStartElement<'_>,
    item: &ManifestItem,
    dir: &str,
    position: Position,
    doc: &mut SmilDocument,
    report: &mut Report,
) {
    if par.is_self_closing() {
        return;
    }

    let mut text_fragment = None;
    let mut clip_begin = None;
    let mut clip_end = None;
    let mut depth = 0usize;

    while let Some(event) = reader.next() {
        let Ok(event) = event else { continue };
        match event.kind {
            XmlEventKind::Start(child) if child.local_name() == b"par" => depth += 1,
            XmlEventKind::Start(child) if child.local_name() == b"text" => {
                let src = child.attribute("src").unwrap_or_default();
                text_fragment = uri::fragment(&src).map(str::to_owned);
                push_reference(item, dir, &src, event.position, &mut doc.facts.references);
            }
            XmlEventKind::Start(child) if child.local_name() == b"audio" => {
                let src = child.attribute("src").unwrap_or_default();
                push_reference(item, dir, &src, event.position, &mut doc.facts.references);

                clip_begin = child.attribute("clipBegin");
                clip_end = child.attribute("clipEnd");
                for (label, value) in [("clipBegin", &clip_begin), ("clipEnd", &clip_end)] {
                    if let Some(raw) = value {
                        if parse_clock_value(raw).is_none() {
                            report.emit(
                                CheckId::Med001,
                                Location::path(item.href.clone()).with_position(event.position),
                                &[&format!("{label}=\"{raw}\"")],
                            );
                        }
                    }
                }
            }
            XmlEventKind::End(name) if name == b"par" => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            _ => {}
        }
    }

    doc.clips.push(SmilClip {
        text_src_fragment: text_fragment,
        clip_begin,
        clip_end,
        position,
    });
}

fn push_reference(item: &ManifestItem, dir: &str, raw: &str, position: Position, references: &mut Vec<Reference>) {
    if raw.is_empty() {
        return;
    }
    if uri::has_scheme(raw) {
        references.push(Reference {
            target_path: raw.to_owned(),
            fragment: None,
            position,
            remote: true,
        });
        return;
    }
    let _ = item;
    let resolved = uri::resolve(dir, raw);
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

/// Parses a SMIL clock value: full (`hh:mm:ss.fraction`), partial
/// (`mm:ss.fraction`), or timecount (`3.2s`, `500ms`, `2min`, `1h`) form,
/// returning the value in seconds.
pub fn parse_clock_value(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(stripped) = value.strip_suffix("ms") {
        return stripped.trim().parse::<f64>().ok().map(|v| v / 1000.0);
    }
    if let Some(stripped) = value.strip_suffix("min") {
        return stripped.trim().parse::<f64>().ok().map(|v| v * 60.0);
    }
    if let Some(stripped) = value.strip_suffix('h') {
        return stripped.trim().parse::<f64>().ok().map(|v| v * 3600.0);
    }
    if let Some(stripped) = value.strip_suffix('s') {
        return stripped.trim().parse::<f64>().ok();
    }

    let parts: Vec<&str> = value.split(':').collect();
    match parts.len() {
        1 => parts[0].parse::<f64>().ok(),
        2 => {
            let minutes: f64 = parts[0].parse().ok()?;
            let seconds: f64 = parts[1].parse().ok()?;
            Some(minutes * 60.0 + seconds)
        }
        3 => {
            let hours: f64 = parts[0].parse().ok()?;
            let minutes: f64 = parts[1].parse().ok()?;
            let seconds: f64 = parts[2].parse().ok()?;
            Some(hours * 3600.0 + minutes * 60.0 + seconds)
        }
        _ => None,
    }
}

/// Sums every clip's duration (`clipEnd - clipBegin`, or `clipEnd` alone
/// when `clipBegin` is absent) for `MED-002`'s per-item total. Clips with
/// an unparseable clock value (already flagged via `MED-001`) are skipped
/// rather than poisoning the total with a bogus value.
pub fn total_seconds(clips: &[SmilClip]) -> f64 {
    clips
        .iter()
        .filter_map(|clip| {
            let end = clip.clip_end.as_deref().and_then(parse_clock_value)?;
            let begin = clip
                .clip_begin
                .as_deref()
                .and_then(parse_clock_value)
                .unwrap_or(0.0);
            Some((end - begin).max(0.0))
        })
        .sum()
}
