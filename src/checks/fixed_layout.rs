//! Fixed-layout / rendition checking (spec.md §4.K): viewport/viewBox
//! presence per spine item once `rendition:layout=pre-paginated` is
//! effective, plus enumerated-value and deprecation checks for
//! `rendition:spread`/`rendition:orientation`/`rendition:flow`.
//!
//! Rendition properties are ordinary `<meta property="rendition:...">`
//! publication-level values, overridable per spine item by an
//! `rendition:<axis>-<value>` itemref property token (spec.md §3's Spine
//! itemref description); this module resolves the effective value the same
//! "override wins, else publication default" way `checks::opf`'s effective
//! media-type resolution does for fallback chains.

use crate::catalog::CheckId;
use crate::location::Location;
use crate::model::content_doc::{ContentDocument, XhtmlDocument};
use crate::model::manifest::{Manifest, ManifestItem};
use crate::model::metadata::Metadata;
use crate::model::spine::{Spine, SpineItemRef};
use crate::report::Report;

const ORIENTATION_VALUES: &[&str] = &["auto", "landscape", "portrait"];
const SPREAD_VALUES: &[&str] = &["auto", "both", "none"];
const SPREAD_DEPRECATED: &[&str] = &["landscape", "portrait"];
const FLOW_VALUES: &[&str] = &["auto", "paginated", "scrolled-continuous", "scrolled-doc"];

/// Whether fixed-layout (`rendition:layout=pre-paginated`) is effective
/// for this spine item, publication-level value overridden per item.
pub fn is_fixed_layout(metadata: &Metadata, itemref: &SpineItemRef) -> bool {
    match itemref_override(itemref, "layout") {
        Some(value) => value == "pre-paginated",
        None => publication_value(metadata, "rendition:layout").as_deref() == Some("pre-paginated"),
    }
}

fn itemref_override<'a>(itemref: &'a SpineItemRef, axis: &str) -> Option<&'a str> {
    let prefix = format!("rendition:{axis}-");
    itemref
        .properties
        .iter()
        .find_map(|property| property.strip_prefix(prefix.as_str()))
}

fn publication_value<'a>(metadata: &'a Metadata, property: &str) -> Option<&'a str> {
    metadata
        .meta
        .iter()
        .find(|meta| meta.property == property)
        .map(|meta| meta.value.as_str())
}

/// Per-spine-item fixed-layout and rendition-vocabulary checks. Called
/// once per linear and non-linear spine item alike; `content` is the
/// already-parsed content document for this item, if its media-type is
/// one this engine parses (`ContentDocument::facts` callers always have
/// this by the time this pass runs).
pub fn check_item(
    metadata: &Metadata,
    itemref: &SpineItemRef,
    item: &ManifestItem,
    content: Option<&ContentDocument>,
    report: &mut Report,
) {
    check_rendition_value(metadata, itemref, "orientation", ORIENTATION_VALUES, &[], report);
    check_rendition_value(metadata, itemref, "spread", SPREAD_VALUES, SPREAD_DEPRECATED, report);
    check_rendition_value(metadata, itemref, "flow", FLOW_VALUES, &[], report);

    if !is_fixed_layout(metadata, itemref) {
        return;
    }

    match content {
        Some(ContentDocument::Xhtml(XhtmlDocument { viewport_content, .. })) => {
            if viewport_content.is_none() {
                report.emit(
                    CheckId::Htm013,
                    Location::path(item.href.clone()).with_position(item.position),
                    &[&item.href],
                );
            }
        }
        Some(ContentDocument::Svg(svg)) => {
            if !svg.has_view_box {
                report.emit(
                    CheckId::Htm015,
                    Location::path(item.href.clone()).with_position(item.position),
                    &[],
                );
            }
        }
        _ => {}
    }
}

fn check_rendition_value(
    metadata: &Metadata,
    itemref: &SpineItemRef,
    axis: &str,
    allowed: &[&str],
    deprecated: &[&str],
    report: &mut Report,
) {
    let property = format!("rendition:{axis}");
    let (value, overridden) = match itemref_override(itemref, axis) {
        Some(value) => (Some(value), true),
        None => (publication_value(metadata, &property), false),
    };
    let Some(value) = value else { return };

    let location = if overridden { Location::root().with_position(itemref.position) } else { Location::root() };

    if !allowed.contains(&value) && !deprecated.contains(&value) {
        report.emit(CheckId::Htm022, location.clone(), &[&property, value]);
        return;
    }
    if deprecated.contains(&value) {
        report.emit(CheckId::Htm023, location, &[&property, value]);
    }
}

/// Runs [`check_item`] over every spine item, looking up each one's parsed
/// content document (if any) from `documents` by manifest href.
pub fn check_spine(
    metadata: &Metadata,
    spine: &Spine,
    manifest: &Manifest,
    documents: &[(String, ContentDocument)],
    report: &mut Report,
) {
    for itemref in &spine.items {
        let Some(item) = manifest.0.by_key(itemref.idref.as_str()) else { continue };
        let content = documents.iter().find(|(path, _)| path == &item.href).map(|(_, doc)| doc);
        check_item(metadata, itemref, item, content, report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Position;
    use crate::model::content_doc::{DocumentFacts, SvgDocument};
    use crate::model::metadata::Meta;

    fn metadata_with(property: &str, value: &str) -> Metadata {
        let mut metadata = Metadata::default();
        metadata.meta.push(Meta {
            id: None,
            property: property.to_owned(),
            value: value.to_owned(),
            refines: None,
            scheme: None,
            position: Position::new(1, 1),
        });
        metadata
    }

    fn itemref(properties: &[&str]) -> SpineItemRef {
        SpineItemRef {
            idref: "c1".into(),
            linear: None,
            properties: properties.iter().map(|p| p.to_string()).collect(),
            position: Position::new(1, 1),
        }
    }

    fn item() -> ManifestItem {
        ManifestItem {
            id: "c1".into(),
            href: "c1.xhtml".into(),
            media_type: "application/xhtml+xml".into(),
            fallback: None,
            media_overlay: None,
            properties: Vec::new(),
            position: Position::new(1, 1),
        }
    }

    #[test]
    fn publication_level_layout_applies_by_default() {
        let metadata = metadata_with("rendition:layout", "pre-paginated");
        assert!(is_fixed_layout(&metadata, &itemref(&[])));
    }

    #[test]
    fn itemref_override_wins_over_publication_default() {
        let metadata = metadata_with("rendition:layout", "pre-paginated");
        assert!(!is_fixed_layout(&metadata, &itemref(&["rendition:layout-reflowable"])));
    }

    #[test]
    fn missing_viewport_on_fixed_layout_xhtml_is_flagged() {
        let metadata = metadata_with("rendition:layout", "pre-paginated");
        let content = ContentDocument::Xhtml(XhtmlDocument { facts: DocumentFacts::default(), ..Default::default() });
        let mut report = Report::new();
        check_item(&metadata, &itemref(&[]), &item(), Some(&content), &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Htm013));
    }

    #[test]
    fn missing_view_box_on_fixed_layout_svg_is_flagged() {
        let metadata = metadata_with("rendition:layout", "pre-paginated");
        let content = ContentDocument::Svg(SvgDocument { facts: DocumentFacts::default(), has_view_box: false });
        let mut report = Report::new();
        check_item(&metadata, &itemref(&[]), &item(), Some(&content), &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Htm015));
    }

    #[test]
    fn deprecated_spread_value_is_warned() {
        let metadata = metadata_with("rendition:spread", "landscape");
        let mut report = Report::new();
        check_item(&metadata, &itemref(&[]), &item(), None, &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Htm023));
    }

    #[test]
    fn unrecognized_flow_value_is_flagged() {
        let metadata = metadata_with("rendition:flow", "bogus");
        let mut report = Report::new();
        check_item(&metadata, &itemref(&[]), &item(), None, &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Htm022));
    }
}
