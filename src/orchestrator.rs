//! Drives the full validation pipeline end to end (spec.md §4, "Top-level
//! flow"): open the archive, gate on `mimetype`/`container.xml`/the package
//! document, dispatch every manifest item to its content-document checker,
//! then run every cross-document pass (navigation, fixed-layout,
//! cross-reference resolution, accessibility, media overlays) over the
//! fully-parsed publication.
//!
//! Every step here calls into an already-grounded `checks::*` function;
//! this module's own job is sequencing, early-exit on fatal gates, and the
//! handful of checks that only make sense once the whole publication is
//! assembled (`NCX-001` dtb:uid, `MED-002` duration sums, `CSS-029`
//! active-class, unresolved spine idrefs). [`log`] is used the way the
//! teacher's `ebook` crate uses it: `debug!` for per-run milestones,
//! `trace!` for per-item detail, never on the hot per-byte parsing path.

use std::collections::HashSet;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::archive::errors::ArchiveError;
use crate::archive::single::{SingleFileArchive, SINGLE_FILE_PATH};
use crate::archive::zip::ZipArchive;
use crate::archive::{self, Archive};
use crate::catalog::CheckId;
use crate::checks;
use crate::checks::content::{ncx, smil, svg, xhtml};
use crate::error::{EngineError, EngineResult};
use crate::location::{Location, Position};
use crate::model::container::RootFile;
use crate::model::content_doc::{ContentDocument, CssDocument, NcxDocument};
use crate::model::manifest::ManifestItem;
use crate::model::{ContainerDocument, EpubVersion, PackageDocument};
use crate::options::Options;
use crate::report::{FinishedReport, Report};

/// Validates the EPUB archive (or unpacked directory) at `path`.
pub fn run_path(path: &Path, options: Options) -> EngineResult<FinishedReport> {
    if options.single_file_mode {
        let bytes = std::fs::read(path).map_err(|source| EngineError::Io {
            path: path.display().to_string(),
            source,
        })?;
        return Ok(run_single_file(&SingleFileArchive::new(bytes), &options));
    }

    let archive = archive::open(path).map_err(|error| to_engine_error(path, error))?;
    Ok(run(archive.as_ref(), &options))
}

/// Validates an EPUB already available as a [`Read`] + [`Seek`] byte
/// stream (a ZIP archive; single-file mode reads the stream to the end and
/// treats its entire content as one document).
pub fn run_zip<R: Read + Seek + Send + 'static>(mut reader: R, options: Options) -> EngineResult<FinishedReport> {
    if options.single_file_mode {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| EngineError::Io { path: String::new(), source })?;
        return Ok(run_single_file(&SingleFileArchive::new(bytes), &options));
    }

    let archive = ZipArchive::new(reader).map_err(|error| match error {
        ArchiveError::Unreadable { source, .. } => {
            EngineError::OpenArchive { path: PathBuf::from("<in-memory>"), source }
        }
        other => EngineError::Aborted(Box::leak(other.to_string().into_boxed_str())),
    })?;
    Ok(run(&archive, &options))
}

fn to_engine_error(path: &Path, error: ArchiveError) -> EngineError {
    match error {
        ArchiveError::Unreadable { path: reported, source } => {
            EngineError::OpenArchive { path: reported.unwrap_or_else(|| path.to_path_buf()), source }
        }
        other => EngineError::Aborted(Box::leak(other.to_string().into_boxed_str())),
    }
}

/// Single-file mode (spec.md §4.M, `Options::single_file_mode`): there is
/// no container or package document, so every container/package-level
/// check (`OCF-*`, most `OPF-*`) simply does not run; the remap table this
/// mode documents reduces in practice to "the lone document is checked as
/// XHTML, and a malformed document still surfaces as `RSC-005`" since that
/// is exactly what [`xhtml::check`] already does on its own.
fn run_single_file(archive: &dyn Archive, options: &Options) -> FinishedReport {
    let mut report = Report::new();
    apply_overrides(options, &mut report);

    let bytes = archive.read(SINGLE_FILE_PATH).unwrap_or_default();
    checks::encoding::check_document(SINGLE_FILE_PATH, &bytes, &mut report);

    let item = ManifestItem {
        id: "document".into(),
        href: SINGLE_FILE_PATH.to_owned(),
        media_type: "application/xhtml+xml".into(),
        fallback: None,
        media_overlay: None,
        properties: Vec::new(),
        position: Position::new(1, 1),
    };
    xhtml::check(&item, &bytes, &mut report);

    report.finish()
}

fn apply_overrides(options: &Options, report: &mut Report) {
    for (id, severity) in &options.feature_overrides {
        report.set_override(*id, *severity);
    }
}

/// The full-archive pipeline, shared by [`run_path`] and [`run_zip`].
fn run(archive: &dyn Archive, options: &Options) -> FinishedReport {
    let mut report = Report::new();
    apply_overrides(options, &mut report);

    checks::ocf::check_permitted_meta_inf(archive, &mut report);
    checks::ocf::check_entry_paths(archive, &mut report);
    checks::pkg::check_file_names(archive, &mut report);
    checks::ocf::check_mimetype(archive, &mut report);

    let container_bytes = match archive.read("META-INF/container.xml") {
        Ok(bytes) => bytes,
        Err(_) => {
            report.emit_plain(CheckId::Ocf005, Location::root());
            return report.finish();
        }
    };
    let container = match ContainerDocument::parse(&container_bytes) {
        Ok(container) => container,
        Err(error) => {
            report.emit(
                CheckId::Ocf006,
                Location::path("META-INF/container.xml"),
                &[&error.to_string()],
            );
            return report.finish();
        }
    };
    if !checks::ocf::check_has_package_rootfile(&container, &mut report) {
        return report.finish();
    }
    let rootfile: &RootFile = container.package_rootfile().expect("checked above");
    let opf_path = rootfile.full_path.clone();

    let opf_bytes = match archive.read(&opf_path) {
        Ok(bytes) => bytes,
        Err(_) => {
            report.emit(CheckId::Rsc001, Location::path(opf_path.clone()), &[&opf_path]);
            return report.finish();
        }
    };

    if !checks::encoding::check_opf(&opf_path, &opf_bytes, &mut report) {
        return report.finish();
    }

    let package = match PackageDocument::parse(&opf_path, &opf_bytes) {
        Ok(package) => package,
        Err(error) => {
            report.emit(CheckId::Rsc005, Location::path(opf_path.clone()), &[&error.to_string()]);
            return report.finish();
        }
    };

    if EpubVersion::parse(&package.version_raw).is_none() {
        report.emit(CheckId::Opf001, Location::path(opf_path.clone()), &[&package.version_raw]);
        return report.finish();
    }

    debug!(
        "validating {opf_path} ({} manifest items, {} spine items)",
        package.manifest.iter().count(),
        package.spine.iter().count(),
    );

    // `E2-001`: an EPUB 3 package is never required to carry an NCX
    // alongside its nav document, so one present is always a retained
    // legacy feature, not a defect.
    if package.version == EpubVersion::Epub3 {
        if let Some(ncx_item) = package.manifest.iter().find(|item| item.media_type == "application/x-dtbncx+xml") {
            report.emit(
                CheckId::E2001,
                Location::path(ncx_item.href.clone()).with_position(ncx_item.position),
                &["NCX"],
            );
        }
    }

    let mut documents: Vec<(String, ContentDocument)> = Vec::new();
    let mut referenced: HashSet<String> = HashSet::new();
    referenced.insert(opf_path.clone());

    for item in package.manifest.iter() {
        referenced.insert(item.href.clone());

        let bytes = match archive.read(&item.href) {
            Ok(bytes) => bytes,
            Err(error) => {
                report.emit(
                    CheckId::Chk001,
                    Location::path(item.href.clone()),
                    &[&item.href, &error.to_string()],
                );
                continue;
            }
        };
        checks::encoding::check_document(&item.href, &bytes, &mut report);

        let doc = match item.media_type.as_str() {
            "application/xhtml+xml" => ContentDocument::Xhtml(xhtml::check(item, &bytes, &mut report)),
            "image/svg+xml" => ContentDocument::Svg(svg::check(item, &bytes, &mut report)),
            "application/smil+xml" => ContentDocument::Smil(smil::check(item, &bytes, &mut report)),
            "application/x-dtbncx+xml" => ContentDocument::Ncx(ncx::check(item, &bytes, &mut report)),
            "text/css" => ContentDocument::Css(checks::css::check(item, &bytes, &mut report)),
            _ => continue,
        };
        trace!("parsed {} as {}", item.href, item.media_type);
        documents.push((item.href.clone(), doc));
    }

    // `NCX-001`: the NCX's `dtb:uid` is only checkable once both the OPF
    // (for the nominated unique identifier) and the NCX itself have been
    // parsed.
    if let Some((ncx_path, ncx_doc)) = documents.iter().find_map(|(path, doc)| match doc {
        ContentDocument::Ncx(ncx_doc) => Some((path.clone(), ncx_doc)),
        _ => None,
    }) {
        if let Some(ncx_item) = package.manifest.by_href(&ncx_path) {
            ncx::check_dtb_uid(ncx_doc, package.unique_identifier(), ncx_item, &mut report);
        }
    }

    if package.version == EpubVersion::Epub3 {
        if let Some(nav_item) = package.manifest.iter().find(|item| item.has_property("nav")) {
            if let Ok(nav_bytes) = archive.read(&nav_item.href) {
                checks::nav::check_epub3_nav(&nav_item.href, &nav_bytes, &package.spine, &package.manifest, &mut report);
            }
        }
    } else {
        let ncx_doc = documents.iter().find_map(|(_, doc)| match doc {
            ContentDocument::Ncx(ncx_doc) => Some(ncx_doc),
            _ => None,
        });
        let fallback_ncx = NcxDocument::default();
        checks::nav::check_epub2_ncx(ncx_doc.unwrap_or(&fallback_ncx), &package.spine, &mut report);
    }

    checks::fixed_layout::check_spine(&package.metadata, &package.spine, &package.manifest, &documents, &mut report);
    checks::xref::check(&documents, &package.manifest, &opf_path, &mut report);
    checks::accessibility::check(&documents, &package.metadata, &mut report);

    // `CSS-029`: the active-class is a publication-level declaration
    // (`meta property="media:active-class"`), checked against every
    // stylesheet reachable from the manifest at once.
    if let Some(active_class) = package
        .metadata
        .meta
        .iter()
        .find(|meta| meta.property == "media:active-class")
        .map(|meta| meta.value.as_str())
    {
        let stylesheets: Vec<&CssDocument> = documents
            .iter()
            .filter_map(|(_, doc)| match doc {
                ContentDocument::Css(css) => Some(css),
                _ => None,
            })
            .collect();
        if !stylesheets.is_empty() {
            checks::css::check_active_class_declared(active_class, &stylesheets, &mut report);
        }
    }

    check_media_overlay_durations(&package, &documents, &mut report);
    check_spine_idref_resolution(&package, &mut report);

    checks::opf::check_manifest_media_types(&package.manifest, archive, &mut report);
    checks::opf::check_required_metadata(&package.metadata, package.version, &mut report);
    checks::opf::check_dcterms_modified(&package.metadata, package.version, &mut report);
    checks::opf::check_refines(&package.metadata, &mut report);
    checks::opf::check_manifest_properties(&package.manifest, &package.metadata, &mut report);
    checks::opf::check_cover_image(&package.manifest, &mut report);
    checks::opf::check_fallback_chains(&package.manifest, &package.spine, &mut report);
    checks::opf::check_spine(&package.spine, &package.manifest, &mut report);
    checks::opf::check_media_overlays(&package.manifest, &mut report);
    checks::opf::check_collections(&package.collections, &mut report);
    checks::opf::check_guide(package.guide.is_some(), package.version, &mut report);

    check_url_conformance(&package, &container, &mut report);

    checks::ocf::check_unreferenced_entries(archive, &referenced, &mut report);
    checks::pkg::check_opf_extension(&opf_path, &mut report);

    let finished = report.finish();
    trace!("finished validating {opf_path}: {} findings", finished.findings.len());
    finished
}

/// `MED-002`: sums each overlay SMIL document's clips and compares the
/// total against the `meta property="media:duration" refines="#<xhtml id>"`
/// the spine item carrying `media-overlay="<smil id>"` declares, if any.
/// A publication that never declares `media:duration` is silently exempt,
/// since the comparison has nothing to check against.
fn check_media_overlay_durations(
    package: &PackageDocument,
    documents: &[(String, ContentDocument)],
    report: &mut Report,
) {
    // Spec.md §9: "string-equal after normalization to seconds... larger
    // tolerances are a design change, not a bug fix." This only absorbs
    // float round-off from clock-value parsing/summation, not real
    // mismatches.
    const TOLERANCE_SECONDS: f64 = 1e-3;

    for item in package.manifest.iter() {
        let Some(overlay_id) = &item.media_overlay else { continue };
        let Some(overlay_item) = package.manifest.by_id(overlay_id) else { continue };
        let Some(smil_doc) = documents.iter().find_map(|(path, doc)| match doc {
            ContentDocument::Smil(smil_doc) if path == &overlay_item.href => Some(smil_doc),
            _ => None,
        }) else {
            continue;
        };

        let refines_target = format!("#{}", item.id);
        let Some(meta) = package
            .metadata
            .meta
            .iter()
            .find(|meta| meta.property == "media:duration" && meta.refines.as_deref() == Some(refines_target.as_str()))
        else {
            continue;
        };
        let Some(expected) = smil::parse_clock_value(&meta.value) else {
            continue;
        };

        let actual = smil::total_seconds(&smil_doc.clips);
        if (actual - expected).abs() > TOLERANCE_SECONDS {
            report.emit(
                CheckId::Med002,
                Location::path(item.href.clone()).with_position(item.position),
                &[&format!("{actual:.3}"), &meta.value],
            );
        }
    }
}

/// `RSC-001`: a spine `itemref` whose `idref` resolves to no manifest item.
/// `checks::opf::check_spine` deliberately leaves this to cross-reference
/// resolution; unlike every other reference xref walks, this one isn't
/// reachable from a parsed content document's own facts, so it is checked
/// here instead.
fn check_spine_idref_resolution(package: &PackageDocument, report: &mut Report) {
    for itemref in package.spine.iter() {
        if package.manifest.by_id(&itemref.idref).is_none() {
            report.emit(
                CheckId::Rsc001,
                Location::path(package.path.clone()).with_position(itemref.position),
                &[&itemref.idref],
            );
        }
    }
}

fn is_conforming_url_reference(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| !c.is_control() && c != '\\')
}

/// `RSC-020`: flags hrefs that could never have come from a well-formed URL
/// reference (a raw control character or backslash) regardless of how they
/// were percent-encoded. Spaces are not checked here since a decoded href
/// legitimately contains them once `%20` has been unescaped.
fn check_url_conformance(package: &PackageDocument, container: &ContainerDocument, report: &mut Report) {
    for item in package.manifest.iter() {
        if !is_conforming_url_reference(&item.href) {
            report.emit(
                CheckId::Rsc020,
                Location::path(item.href.clone()).with_position(item.position),
                &[&item.href],
            );
        }
    }
    if let Some(guide) = &package.guide {
        for reference in &guide.references {
            if !is_conforming_url_reference(&reference.href) {
                report.emit(CheckId::Rsc020, Location::path(reference.href.clone()), &[&reference.href]);
            }
        }
    }
    for rootfile in &container.rootfiles {
        if !is_conforming_url_reference(&rootfile.full_path) {
            report.emit(CheckId::Rsc020, Location::path(rootfile.full_path.clone()), &[&rootfile.full_path]);
        }
    }
    for link in &container.links {
        if !is_conforming_url_reference(link) {
            report.emit(CheckId::Rsc020, Location::path(link.clone()), &[link]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn write_entry(zip: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, content: &[u8], stored: bool) {
        let options = SimpleFileOptions::default().compression_method(if stored {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        });
        zip.start_file(name, options).unwrap();
        zip.write_all(content).unwrap();
    }

    fn minimal_epub() -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        write_entry(&mut zip, "mimetype", b"application/epub+zip", true);
        write_entry(
            &mut zip,
            "META-INF/container.xml",
            br#"<?xml version="1.0"?>
            <container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
              <rootfiles>
                <rootfile full-path="EPUB/package.opf" media-type="application/oebps-package+xml"/>
              </rootfiles>
            </container>"#,
            false,
        );
        write_entry(
            &mut zip,
            "EPUB/package.opf",
            br#"<?xml version="1.0"?>
            <package version="3.0" unique-identifier="pub-id" xmlns="http://www.idpf.org/2007/opf">
              <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
                <dc:identifier id="pub-id">urn:uuid:1234</dc:identifier>
                <dc:title>Sample</dc:title>
                <dc:language>en</dc:language>
                <meta property="dcterms:modified">2024-01-01T00:00:00Z</meta>
              </metadata>
              <manifest>
                <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
                <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
              </manifest>
              <spine>
                <itemref idref="c1"/>
              </spine>
            </package>"#,
            false,
        );
        write_entry(
            &mut zip,
            "EPUB/c1.xhtml",
            br#"<?xml version="1.0"?>
            <html xmlns="http://www.w3.org/1999/xhtml" lang="en">
              <head><title>c1</title></head>
              <body><p>hello</p></body>
            </html>"#,
            false,
        );
        write_entry(
            &mut zip,
            "EPUB/nav.xhtml",
            br#"<?xml version="1.0"?>
            <html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="en">
              <head><title>nav</title></head>
              <body>
                <nav epub:type="toc">
                  <ol><li><a href="c1.xhtml">Chapter 1</a></li></ol>
                </nav>
              </body>
            </html>"#,
            false,
        );
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn minimal_epub_is_conforming() {
        let bytes = minimal_epub();
        let options = Options::default();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let finished = run(&archive, &options);
        assert!(finished.is_conforming(), "{:#?}", finished.findings);
    }

    #[test]
    fn missing_container_is_fatal() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        write_entry(&mut zip, "mimetype", b"application/epub+zip", true);
        let bytes = zip.finish().unwrap().into_inner();

        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let finished = run(&archive, &Options::default());
        assert!(!finished.is_conforming());
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Ocf005));
    }

    #[test]
    fn single_file_mode_checks_bytes_directly() {
        let xhtml = br#"<html xmlns="http://www.w3.org/1999/xhtml"><body><img src="x.png"/></body></html>"#;
        let archive = SingleFileArchive::new(xhtml.to_vec());
        let finished = run_single_file(&archive, &Options::default());
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Acc001));
    }
}
