//! OCF container checks (spec.md §4.E): `mimetype` layout, `container.xml`,
//! permitted `META-INF` files, and unreferenced ("foreign") entries.

use crate::archive::Archive;
use crate::catalog::CheckId;
use crate::location::Location;
use crate::model::ContainerDocument;
use crate::report::Report;

const PERMITTED_META_INF: &[&str] = &[
    "META-INF/container.xml",
    "META-INF/encryption.xml",
    "META-INF/manifest.xml",
    "META-INF/metadata.xml",
    "META-INF/rights.xml",
    "META-INF/signatures.xml",
];

pub const MIMETYPE_CONTENT: &str = "application/epub+zip";

/// Checks the physical layout of the `mimetype` entry: first in the
/// archive, stored (uncompressed), no extra field, and exact content.
/// Returns `true` if `mimetype` is present at all (callers use this to
/// decide whether to keep going; a missing `mimetype` is a `WARNING` in
/// the reference implementation, not fatal — the archive can still be
/// opened and the rootfile found).
pub fn check_mimetype(archive: &dyn Archive, report: &mut Report) -> bool {
    let entries = archive.entries();
    let Some(ordinal) = entries.iter().position(|e| e == "mimetype") else {
        return false;
    };

    if ordinal != 0 {
        report.emit(
            CheckId::Ocf002,
            Location::path("mimetype"),
            &[&ordinal.to_string()],
        );
    }

    if let Some(info) = archive.zip_entry_info("mimetype") {
        if !info.stored || info.extra_field_len != 0 {
            report.emit_plain(CheckId::Ocf004, Location::path("mimetype"));
        }
    }

    if let Ok(bytes) = archive.read("mimetype") {
        if bytes != MIMETYPE_CONTENT.as_bytes() {
            report.emit(
                CheckId::Ocf003,
                Location::path("mimetype"),
                &[&String::from_utf8_lossy(&bytes)],
            );
        }
    }

    true
}

/// Checks every `META-INF/*` entry against the permitted list.
pub fn check_permitted_meta_inf(archive: &dyn Archive, report: &mut Report) {
    for entry in archive.entries() {
        if entry.starts_with("META-INF/") && !PERMITTED_META_INF.contains(&entry.as_str()) {
            report.emit(CheckId::Ocf008, Location::path(entry.clone()), &[&entry]);
        }
    }
}

/// Emits `OCF-009` for every archive entry not under `META-INF/`, not
/// `mimetype`, and not present in `referenced` (the union of every
/// rootfile's manifest hrefs, resolved to archive-relative paths).
pub fn check_unreferenced_entries(
    archive: &dyn Archive,
    referenced: &std::collections::HashSet<String>,
    report: &mut Report,
) {
    for entry in archive.entries() {
        if entry == "mimetype" || entry.starts_with("META-INF/") {
            continue;
        }
        if !referenced.contains(&entry) {
            report.emit(CheckId::Ocf009, Location::path(entry.clone()), &[&entry]);
        }
    }
}

/// Flags any archive entry name that is absolute or climbs out of the
/// archive root via `..` (`OCF-010`). A conforming zip never needs either;
/// an archive that does is attempting to write outside the extraction
/// directory once unpacked.
pub fn check_entry_paths(archive: &dyn Archive, report: &mut Report) {
    for entry in archive.entries() {
        let escapes = entry.starts_with('/') || entry.split('/').any(|segment| segment == "..");
        if escapes {
            report.emit(CheckId::Ocf010, Location::path(entry.clone()), &[&entry]);
        }
    }
}

/// Validates a parsed [`ContainerDocument`] has at least one package
/// rootfile. Returns `false` (fatal, per spec.md §4.E) when none is found.
pub fn check_has_package_rootfile(container: &ContainerDocument, report: &mut Report) -> bool {
    if container.package_rootfile().is_some() {
        true
    } else {
        report.emit_plain(CheckId::Ocf007, Location::root());
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::single::SingleFileArchive;
    use crate::model::container::RootFile;

    struct FakeArchive(Vec<String>);

    impl Archive for FakeArchive {
        fn read(&self, _path: &str) -> crate::archive::errors::ArchiveResult<Vec<u8>> {
            Ok(Vec::new())
        }
        fn exists(&self, path: &str) -> bool {
            self.0.contains(&path.to_owned())
        }
        fn entries(&self) -> Vec<String> {
            self.0.clone()
        }
    }

    #[test]
    fn missing_mimetype_is_reported_as_absent() {
        let archive = SingleFileArchive::new(Vec::new());
        assert!(!check_mimetype(&archive, &mut Report::new()));
    }

    #[test]
    fn traversal_entry_is_flagged() {
        let archive = FakeArchive(vec!["mimetype".into(), "../evil.txt".into()]);
        let mut report = Report::new();
        check_entry_paths(&archive, &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Ocf010));
    }

    #[test]
    fn package_rootfile_required() {
        let mut report = Report::new();
        let empty = ContainerDocument::default();
        assert!(!check_has_package_rootfile(&empty, &mut report));

        let mut with_rootfile = ContainerDocument::default();
        with_rootfile.rootfiles.push(RootFile {
            full_path: "EPUB/package.opf".into(),
            media_type: "application/oebps-package+xml".into(),
        });
        let mut report = Report::new();
        assert!(check_has_package_rootfile(&with_rootfile, &mut report));
    }
}
