//! Package-document checks (spec.md §4.F): metadata, manifest, spine,
//! media overlays, and collections.

use crate::archive::Archive;
use crate::catalog::CheckId;
use crate::location::Location;
use crate::model::{Collection, EpubVersion, Manifest, Metadata, Spine};
use crate::report::Report;

/// Media-type equivalence groups (spec.md §4.F) consulted by
/// [`check_manifest_media_types`] before treating a mismatch as `OPF-024`.
const MEDIA_TYPE_EQUIVALENCE: &[&[&str]] = &[
    &["image/jpeg", "image/jpg"],
    &["font/woff", "application/font-woff"],
    &["font/otf", "application/vnd.ms-opentype", "application/font-sfnt"],
    &["application/javascript", "text/javascript"],
    &["video/mp4", "application/mp4"],
];

/// EPUB 3 Core Media Types: content that may appear directly as a spine
/// itemref target without needing a fallback (`OPF-038`).
const CORE_MEDIA_TYPES: &[&str] = &[
    "application/xhtml+xml",
    "application/x-dtbncx+xml",
    "text/css",
    "image/gif",
    "image/jpeg",
    "image/png",
    "image/svg+xml",
    "application/javascript",
    "text/javascript",
    "audio/mpeg",
    "audio/mp4",
    "audio/ogg",
    "font/woff",
    "font/woff2",
    "font/otf",
    "font/ttf",
    "application/font-woff",
    "application/smil+xml",
    "application/pls+xml",
];

/// The EPUB 3 reserved `properties` vocabulary for manifest items.
const RESERVED_MANIFEST_PROPERTIES: &[&str] = &[
    "cover-image",
    "mathml",
    "nav",
    "remote-resources",
    "scripted",
    "svg",
    "switch",
    "data-nav",
];

fn media_types_equivalent(a: &str, b: &str) -> bool {
    a == b || MEDIA_TYPE_EQUIVALENCE.iter().any(|group| group.contains(&a) && group.contains(&b))
}

/// Sniffs a coarse media type from leading magic bytes, for the subset of
/// binary formats this engine can tell apart without a full image/font
/// parser: PNG, JPEG, GIF, and SVG's textual signature.
fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        _ => {
            let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]);
            if head.contains("<svg") {
                Some("image/svg+xml")
            } else {
                None
            }
        }
    }
}

/// Checks declared manifest media-types against a magic-byte sniff of
/// their actual content, for the formats [`sniff_media_type`] recognizes.
/// Formats it cannot sniff (fonts, audio, most XML-based types) are
/// skipped rather than guessed at.
pub fn check_manifest_media_types(manifest: &Manifest, archive: &dyn Archive, report: &mut Report) {
    for item in manifest.iter() {
        let Ok(bytes) = archive.read(&item.href) else {
            continue;
        };
        let Some(sniffed) = sniff_media_type(&bytes) else {
            continue;
        };
        if !media_types_equivalent(&item.media_type, sniffed) {
            report.emit(
                CheckId::Opf024,
                Location::path(item.href.clone()).with_position(item.position),
                &[&item.href, &item.media_type, sniffed],
            );
        }
    }
}

/// `dc:title`/`dc:identifier`/`dc:language` presence (EPUB 3; spec.md §4.F).
pub fn check_required_metadata(metadata: &Metadata, version: EpubVersion, report: &mut Report) {
    if version != EpubVersion::Epub3 {
        return;
    }
    if metadata.titles.is_empty() {
        report.emit(CheckId::Opf003, Location::root(), &["dc:title"]);
    }
    if metadata.identifiers.is_empty() {
        report.emit(CheckId::Opf003, Location::root(), &["dc:identifier"]);
    }
    if metadata.languages.is_empty() {
        report.emit(CheckId::Opf003, Location::root(), &["dc:language"]);
    }
}

/// Exactly one `meta property="dcterms:modified"` with a W3CDTF value
/// (spec.md §4.F; `OPF-004`/`OPF-005`).
pub fn check_dcterms_modified(metadata: &Metadata, version: EpubVersion, report: &mut Report) {
    if version != EpubVersion::Epub3 {
        return;
    }
    let modified = metadata.modified();
    if modified.len() != 1 {
        report.emit(CheckId::Opf004, Location::root(), &[&modified.len().to_string()]);
        return;
    }
    let entry = modified[0];
    if !is_w3cdtf(&entry.value) {
        report.emit(
            CheckId::Opf005,
            Location::root().with_position(entry.position),
            &[&entry.value],
        );
    }
}

/// A permissive W3CDTF check: `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, or a full
/// date-time with an optional fractional-seconds component and a `Z` or
/// `+hh:mm`/`-hh:mm` offset.
fn is_w3cdtf(value: &str) -> bool {
    let date_time_re_ok = || -> Option<()> {
        let mut chars = value.chars();
        for _ in 0..4 {
            chars.next().filter(|c| c.is_ascii_digit())?;
        }
        let rest: String = chars.collect();
        if rest.is_empty() {
            return Some(());
        }
        let rest = rest.strip_prefix('-')?;
        if rest.len() < 2 || !rest[..2].chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(())
    };
    value.len() >= 4 && date_time_re_ok().is_some()
}

/// `meta[refines]` must target an id declared somewhere under
/// `<metadata>` (spec.md §4.F; `OPF-007`/`OPF-007a`/`OPF-007b`).
pub fn check_refines(metadata: &Metadata, report: &mut Report) {
    // Spec.md §4.F: a refinement target may be any id declared anywhere
    // under `<metadata>`, including DC elements with no dedicated field
    // (`dc:subject`, `dc:date`, ...), hence `dc_element_ids` below.
    let mut known_ids: Vec<&str> = Vec::new();
    known_ids.extend(metadata.identifiers.iter().filter_map(|i| i.id.as_deref()));
    known_ids.extend(metadata.titles.iter().filter_map(|t| t.id.as_deref()));
    known_ids.extend(metadata.languages.iter().filter_map(|l| l.id.as_deref()));
    known_ids.extend(metadata.creators.iter().filter_map(|c| c.id.as_deref()));
    known_ids.extend(metadata.contributors.iter().filter_map(|c| c.id.as_deref()));
    known_ids.extend(metadata.meta.iter().filter_map(|m| m.id.as_deref()));
    known_ids.extend(metadata.dc_element_ids.iter().map(String::as_str));

    for meta in &metadata.meta {
        let Some(refines) = &meta.refines else { continue };

        if !refines.starts_with('#') {
            if refines.contains("://") {
                report.emit(
                    CheckId::Opf007b,
                    Location::root().with_position(meta.position),
                    &[refines],
                );
            } else {
                report.emit(
                    CheckId::Opf007a,
                    Location::root().with_position(meta.position),
                    &[refines],
                );
            }
            continue;
        }

        let target = &refines[1..];
        if !known_ids.contains(&target) {
            report.emit(
                CheckId::Opf007,
                Location::root().with_position(meta.position),
                &[refines],
            );
        }
    }
}

/// Manifest-level rules independent of media-type sniffing: `nav`
/// uniqueness and media-type, fragment-free hrefs, and the reserved
/// property vocabulary (spec.md §4.F; `OPF-025`/`OPF-026`/`OPF-027`/
/// `OPF-029`/`OPF-030`).
pub fn check_manifest_properties(manifest: &Manifest, metadata: &Metadata, report: &mut Report) {
    let nav_items: Vec<_> = manifest.iter().filter(|item| item.has_property("nav")).collect();
    if nav_items.len() > 1 {
        report.emit_plain(CheckId::Opf025, Location::root());
    }
    for item in &nav_items {
        if item.media_type != "application/xhtml+xml" {
            report.emit(
                CheckId::Opf026,
                Location::path(item.href.clone()).with_position(item.position),
                &[&item.href],
            );
        }
    }

    for item in manifest.iter() {
        if item.href.contains('#') {
            report.emit(
                CheckId::Opf027,
                Location::path(item.href.clone()).with_position(item.position),
                &[&item.href],
            );
        }

        for property in &item.properties {
            if RESERVED_MANIFEST_PROPERTIES.contains(&property.as_str()) {
                continue;
            }
            match property.split_once(':') {
                Some((prefix, _)) if metadata.has_prefix(prefix) => {
                    report.emit(
                        CheckId::Opf030,
                        Location::path(item.href.clone()).with_position(item.position),
                        &[property, prefix],
                    );
                }
                _ => {
                    report.emit(
                        CheckId::Opf029,
                        Location::path(item.href.clone()).with_position(item.position),
                        &[property],
                    );
                }
            }
        }
    }
}

/// Flags a `cover-image` property declared on more than one manifest item
/// (`OPF-012`), mirroring the `nav`-uniqueness check above.
pub fn check_cover_image(manifest: &Manifest, report: &mut Report) {
    let cover_items: Vec<_> = manifest.iter().filter(|item| item.has_property("cover-image")).collect();
    // Flagged once against the first offending item, not once per item:
    // this is one conformance violation ("more than one declared"), not
    // N of them.
    if let Some(first) = cover_items.first() {
        if cover_items.len() > 1 {
            report.emit_plain(
                CheckId::Opf012,
                Location::path(first.href.clone()).with_position(first.position),
            );
        }
    }
}

/// Manifest fallback-chain cycle detection and terminal-type validation
/// (spec.md §9 "Cyclic graphs"; `OPF-044`/`OPF-088`). Modeled as a
/// coloring DFS over the manifest's own `Vec` (an arena indexed by
/// position), rather than pointer-linked nodes, exactly as spec.md
/// prescribes.
///
/// Cycle detection (`OPF-044`) runs over every manifest item regardless of
/// spine membership — a circular `fallback` chain is malformed no matter
/// where it is reached from. `OPF-088`'s terminal-type rule is narrower:
/// its own message is that a fallback chain never terminates in a
/// *spine-acceptable* media-type, which is only a meaningful requirement
/// for an item a spine `itemref` actually targets. A manifest-only
/// resource with no fallback (an embedded `video/mp4` reached solely via
/// an HTML5 `<video>`/`<object>`, for instance) is a permitted foreign
/// resource, not a spine terminus, so it must not be flagged here; `spine`
/// narrows the check to itemref targets.
pub fn check_fallback_chains(manifest: &Manifest, spine: &Spine, report: &mut Report) {
    #[derive(Copy, Clone, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let items: Vec<_> = manifest.iter().collect();
    let mut colors = vec![Color::White; items.len()];

    fn visit(
        index: usize,
        items: &[&crate::model::ManifestItem],
        manifest: &Manifest,
        colors: &mut [Color],
        report: &mut Report,
    ) {
        if colors[index] == Color::Black {
            return;
        }
        if colors[index] == Color::Gray {
            report.emit(
                CheckId::Opf044,
                Location::path(items[index].href.clone()).with_position(items[index].position),
                &[&items[index].id],
            );
            return;
        }
        colors[index] = Color::Gray;
        if let Some(fallback_id) = &items[index].fallback {
            if let Some(next) = items.iter().position(|i| &i.id == fallback_id) {
                visit(next, items, manifest, colors, report);
            }
        }
        colors[index] = Color::Black;
    }

    for i in 0..items.len() {
        visit(i, &items, manifest, &mut colors, report);
    }

    let spine_idrefs: std::collections::HashSet<&str> =
        spine.iter().map(|itemref| itemref.idref.as_str()).collect();

    for item in &items {
        if !spine_idrefs.contains(item.id.as_str()) {
            continue; // not a spine terminus; a non-core resource here is a permitted foreign reference.
        }
        if CORE_MEDIA_TYPES.contains(&item.media_type.as_str()) {
            continue;
        }
        match manifest.fallback_chain(item) {
            Some(chain) if chain.iter().any(|i| CORE_MEDIA_TYPES.contains(&i.media_type.as_str())) => {}
            Some(_) | None => {
                report.emit(
                    CheckId::Opf088,
                    Location::path(item.href.clone()).with_position(item.position),
                    &[&item.id],
                );
            }
        }
    }
}

/// Spine checks: non-empty, `linear` value, and idref resolution against
/// a spine-acceptable media-type or fallback chain (spec.md §4.F;
/// `OPF-038`/`OPF-039b`).
pub fn check_spine(spine: &Spine, manifest: &Manifest, report: &mut Report) {
    for itemref in spine.iter() {
        if let Some(linear) = &itemref.linear {
            if linear != "yes" && linear != "no" {
                report.emit(
                    CheckId::Opf039b,
                    Location::root().with_position(itemref.position),
                    &[linear],
                );
            }
        }

        let Some(item) = manifest.by_id(&itemref.idref) else {
            continue; // unresolved idref is a cross-reference concern (RSC-001)
        };

        let acceptable = CORE_MEDIA_TYPES.contains(&item.media_type.as_str())
            || manifest
                .fallback_chain(item)
                .is_some_and(|chain| chain.iter().any(|i| CORE_MEDIA_TYPES.contains(&i.media_type.as_str())));

        if !acceptable {
            report.emit(
                CheckId::Opf038,
                Location::root().with_position(itemref.position),
                &[&itemref.idref],
            );
        }
    }
}

/// Media-overlay target type (spec.md §4.F; `OPF-031`).
pub fn check_media_overlays(manifest: &Manifest, report: &mut Report) {
    for item in manifest.iter() {
        let Some(overlay_id) = &item.media_overlay else { continue };
        match manifest.by_id(overlay_id) {
            Some(overlay) if overlay.media_type == "application/smil+xml" => {}
            _ => {
                report.emit(
                    CheckId::Opf031,
                    Location::path(item.href.clone()).with_position(item.position),
                    &[&item.id],
                );
            }
        }
    }
}

/// Collection role and `dictionary`-`dc:type` rules (spec.md §4.F;
/// `OPF-042`/`OPF-046`).
pub fn check_collections(collections: &[Collection], report: &mut Report) {
    fn visit(collection: &Collection, report: &mut Report) {
        if !crate::model::collection::RESERVED_ROLES.contains(&collection.role.as_str()) {
            report.emit(CheckId::Opf042, Location::root(), &[&collection.role]);
        }
        if collection.role == "dictionary" && !collection.dc_types.iter().any(|t| t == "dictionary") {
            report.emit(CheckId::Opf046, Location::root(), &[&collection.role]);
        }
        for child in &collection.children {
            visit(child, report);
        }
    }
    for collection in collections {
        visit(collection, report);
    }
}

/// `<guide>` presence in EPUB 3 (spec.md §4.F; `OPF-043`).
pub fn check_guide(has_guide: bool, version: EpubVersion, report: &mut Report) {
    if has_guide && version == EpubVersion::Epub3 {
        report.emit_plain(CheckId::Opf043, Location::root());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Position;
    use crate::model::manifest::ManifestItem;
    use crate::model::metadata::{Language, Meta};
    use crate::model::SpineItemRef;
    use crate::util::collection::KeyedVec;

    fn item(id: &str, media_type: &str, fallback: Option<&str>) -> ManifestItem {
        ManifestItem {
            id: id.into(),
            href: format!("{id}.bin"),
            media_type: media_type.into(),
            fallback: fallback.map(str::to_owned),
            media_overlay: None,
            properties: Vec::new(),
            position: Position::new(1, 1),
        }
    }

    #[test]
    fn duplicate_cover_image_property_is_flagged() {
        let mut manifest = Manifest::default();
        manifest.0 = KeyedVec(vec![
            { let mut i = item("a", "image/jpeg", None); i.properties.push("cover-image".into()); i },
            { let mut i = item("b", "image/jpeg", None); i.properties.push("cover-image".into()); i },
        ]);

        let mut report = Report::new();
        check_cover_image(&manifest, &mut report);
        let finished = report.finish();
        assert_eq!(finished.findings.iter().filter(|f| f.id == CheckId::Opf012).count(), 1);
    }

    fn spine_of(idrefs: &[&str]) -> Spine {
        let mut spine = Spine::default();
        spine.items = idrefs
            .iter()
            .map(|idref| SpineItemRef {
                idref: (*idref).to_owned(),
                linear: None,
                properties: Vec::new(),
                position: Position::new(1, 1),
            })
            .collect();
        spine
    }

    #[test]
    fn detects_fallback_cycle() {
        let mut manifest = Manifest::default();
        manifest.0 = KeyedVec(vec![
            item("a", "application/x-custom", Some("b")),
            item("b", "application/x-custom", Some("a")),
        ]);

        let mut report = Report::new();
        check_fallback_chains(&manifest, &spine_of(&["a"]), &mut report);
        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Opf044));
    }

    #[test]
    fn fallback_reaching_core_type_is_acceptable() {
        let mut manifest = Manifest::default();
        manifest.0 = KeyedVec(vec![
            item("a", "application/x-custom", Some("b")),
            item("b", "image/png", None),
        ]);

        let mut report = Report::new();
        check_fallback_chains(&manifest, &spine_of(&["a"]), &mut report);
        let finished = report.finish();
        assert!(finished.findings.is_empty());
    }

    #[test]
    fn non_spine_manifest_item_without_fallback_is_not_flagged() {
        // A foreign resource (e.g. a `video/mp4` referenced only from an
        // HTML5 `<video>`) is permitted in the manifest without a
        // fallback as long as it is never a spine terminus.
        let mut manifest = Manifest::default();
        manifest.0 = KeyedVec(vec![
            item("c1", "application/xhtml+xml", None),
            item("clip", "video/mp4", None),
        ]);

        let mut report = Report::new();
        check_fallback_chains(&manifest, &spine_of(&["c1"]), &mut report);
        let finished = report.finish();
        assert!(finished.findings.iter().all(|f| f.id != CheckId::Opf088));
    }

    #[test]
    fn refines_targeting_a_generic_dc_element_id_is_accepted() {
        // `<dc:subject id="subj1">` carries no dedicated field, only an
        // entry in `dc_element_ids`; a `meta[refines="#subj1"]` must still
        // resolve against it.
        let mut metadata = Metadata::default();
        metadata.dc_element_ids.push("subj1".into());
        metadata.meta.push(Meta {
            id: None,
            property: "authority".into(),
            value: "marc:relators".into(),
            refines: Some("#subj1".into()),
            scheme: None,
            position: Position::new(1, 1),
        });

        let mut report = Report::new();
        check_refines(&metadata, &mut report);
        let finished = report.finish();
        assert!(finished.findings.is_empty(), "{:#?}", finished.findings);
    }

    #[test]
    fn refines_targeting_a_dc_language_id_is_accepted() {
        let mut metadata = Metadata::default();
        metadata.languages.push(Language {
            id: Some("lang1".into()),
            value: "en".into(),
            position: Position::new(1, 1),
        });
        metadata.meta.push(Meta {
            id: None,
            property: "display-seq".into(),
            value: "1".into(),
            refines: Some("#lang1".into()),
            scheme: None,
            position: Position::new(1, 1),
        });

        let mut report = Report::new();
        check_refines(&metadata, &mut report);
        let finished = report.finish();
        assert!(finished.findings.is_empty(), "{:#?}", finished.findings);
    }

    #[test]
    fn refines_targeting_an_unknown_id_is_flagged() {
        let mut metadata = Metadata::default();
        metadata.meta.push(Meta {
            id: None,
            property: "role".into(),
            value: "aut".into(),
            refines: Some("#missing".into()),
            scheme: None,
            position: Position::new(1, 1),
        });

        let mut report = Report::new();
        check_refines(&metadata, &mut report);
        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Opf007));
    }

    #[test]
    fn w3cdtf_accepts_full_datetime() {
        assert!(is_w3cdtf("2023-05-01T10:02:00Z"));
        assert!(is_w3cdtf("2023"));
        assert!(!is_w3cdtf("not-a-date"));
    }
}
