//! Packaging recommendations (spec.md §6 `PKG-*`): file-name character
//! restrictions and the package document's file extension. Neither rule
//! is a conformance requirement of the EPUB specification itself, only a
//! packaging *recommendation*, hence both default to `WARNING`.

use crate::archive::Archive;
use crate::catalog::CheckId;
use crate::location::Location;
use crate::report::Report;

/// Characters the packaging recommendation considers safe in an archive
/// entry name: ASCII letters, digits, and `-_./`.
fn is_recommended_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/')
}

/// Flags every archive entry whose name uses a character outside the
/// recommended set (`PKG-001`). `mimetype` is exempt since its name is
/// mandated by the OCF spec, not a publisher choice.
pub fn check_file_names(archive: &dyn Archive, report: &mut Report) {
    for entry in archive.entries() {
        if entry == "mimetype" {
            continue;
        }
        if !entry.chars().all(is_recommended_char) {
            report.emit(CheckId::Pkg001, Location::path(entry.clone()), &[&entry]);
        }
    }
}

/// Flags a package document whose file extension is not `.opf` (`PKG-002`).
pub fn check_opf_extension(path: &str, report: &mut Report) {
    if !path.ends_with(".opf") {
        report.emit(CheckId::Pkg002, Location::path(path.to_owned()), &[path]);
    }
}
