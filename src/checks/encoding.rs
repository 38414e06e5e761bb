//! Byte-level encoding gates (spec.md §4.F "Encoding pre-parse", §6 `ENC-*`).
//!
//! Two entry points, grounded on the same [`parser::encoding`](crate::parser::encoding)
//! sniff/declared-encoding primitives but scoped differently: [`check_opf`]
//! runs once, ahead of package-document parsing, and can abort the whole
//! run (`RSC-016`/`RSC-027`/`RSC-028` are unrecoverable for the one
//! document the entire pipeline depends on); [`check_document`] runs once
//! per content document and only ever warns (`ENC-001`/`ENC-002`/`ENC-003`),
//! since a single mis-encoded chapter does not stop the rest of the
//! archive from being checked.

use crate::catalog::CheckId;
use crate::location::Location;
use crate::parser::encoding::{self, DetectedEncoding};
use crate::report::Report;

/// Runs the OPF encoding pre-parse gate. Returns `false` when the document
/// cannot be handed to the XML parser at all.
pub fn check_opf(path: &str, bytes: &[u8], report: &mut Report) -> bool {
    match encoding::sniff(bytes) {
        DetectedEncoding::Utf16Le | DetectedEncoding::Utf16Be => {
            report.emit_plain(CheckId::Rsc027, Location::path(path.to_owned()));
            return false;
        }
        DetectedEncoding::Ucs4 => {
            report.emit_plain(CheckId::Rsc028, Location::path(path.to_owned()));
            return false;
        }
        DetectedEncoding::Utf8 | DetectedEncoding::Utf8WithBom => {}
        DetectedEncoding::Declared(_) => unreachable!("sniff never returns Declared"),
    }

    if let Some(declared) = encoding::declared_encoding(bytes) {
        if !encoding::is_supported(&declared) {
            report.emit(CheckId::Rsc016, Location::path(path.to_owned()), &[&declared]);
            return false;
        }
    }

    true
}

/// Runs the per-content-document encoding checks. Never aborts parsing;
/// a BOM or encoding mismatch here is a warning, not a fatal gate.
pub fn check_document(path: &str, bytes: &[u8], report: &mut Report) {
    let sniffed = encoding::sniff(bytes);
    if sniffed == DetectedEncoding::Utf8WithBom {
        report.emit_plain(CheckId::Enc001, Location::path(path.to_owned()));
    }

    let Some(declared) = encoding::declared_encoding(bytes) else {
        return;
    };

    if !encoding::is_supported(&declared) {
        report.emit(CheckId::Enc002, Location::path(path.to_owned()), &[&declared]);
        return;
    }

    // `is_supported` accepts both "utf-8" and "utf8"; only the former is
    // the canonical detected form, so the latter is a (harmless) mismatch.
    if declared != "utf-8" {
        report.emit(
            CheckId::Enc003,
            Location::path(path.to_owned()),
            &[&declared, "utf-8"],
        );
    }
}
