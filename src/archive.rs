//! Abstracts over the two ways an EPUB is supplied (spec.md §4.A): a zipped
//! `.epub` file/stream, or a directory holding the already-unpacked
//! contents. [`checks::ocf`](crate::checks::ocf) additionally needs
//! low-level ZIP facts (is `mimetype` the first entry, is it stored, does
//! it carry an extra field) that only make sense for the zipped form;
//! [`Archive::zip_entry_info`] surfaces those where available and returns
//! `None` for a directory archive, where the question does not apply.
//!
//! Grounded on the teacher's `ebook::archive` module: the same
//! `Archive` trait / `ZipArchive` / `DirectoryArchive` split, simplified
//! from `Resource`/`ResourceKey`-typed keys to plain `&str` paths (this
//! engine never needs to address a resource by manifest position, only by
//! archive-relative href) and from the teacher's `util::sync::Lock` to a
//! plain [`std::sync::Mutex`], since there is no async feature to share the
//! wrapper with.

pub mod directory;
pub mod errors;
pub mod single;
pub mod zip;

use crate::archive::errors::{ArchiveError, ArchiveResult};
use std::fs;
use std::io;
use std::path::Path;

/// Low-level ZIP facts about one entry, used by the OCF checks
/// (spec.md §4.E) that care about physical archive layout rather than
/// logical content.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ZipEntryInfo {
    /// Zero-based position of this entry within the central directory.
    pub ordinal: usize,
    /// `true` if the entry is stored (`Stored`), `false` for any
    /// compression method.
    pub stored: bool,
    /// Length in bytes of the local file header's extra field.
    pub extra_field_len: u16,
}

/// A source of EPUB content, addressed by archive-relative path
/// (no leading `/`, forward slashes, percent-decoded).
pub trait Archive: Send + Sync {
    /// Reads the full contents of `path`.
    fn read(&self, path: &str) -> ArchiveResult<Vec<u8>>;

    /// Whether `path` exists in this archive.
    fn exists(&self, path: &str) -> bool;

    /// Every entry path in the archive, directories excluded.
    fn entries(&self) -> Vec<String>;

    /// ZIP-specific metadata for `path`, when this archive is backed by a
    /// real ZIP central directory.
    fn zip_entry_info(&self, _path: &str) -> Option<ZipEntryInfo> {
        None
    }

    /// Reads `path` and decodes it as UTF-8, per the rules in
    /// [`parser::encoding`](crate::parser::encoding) (BOM stripping,
    /// declared-encoding checks are the caller's responsibility; this only
    /// performs the final UTF-8 decode once bytes have been prepared).
    fn read_utf8(&self, path: &str) -> ArchiveResult<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|source| ArchiveError::InvalidUtf8 {
            path: path.to_owned(),
            source,
        })
    }
}

/// Opens `path` as a [`zip::ZipArchive`] if it is a file, or a
/// [`directory::DirectoryArchive`] if it is a directory.
pub fn open(path: &Path) -> ArchiveResult<Box<dyn Archive>> {
    if path.is_dir() {
        Ok(Box::new(directory::DirectoryArchive::new(path)?))
    } else {
        let file = fs::File::open(path).map_err(|source| ArchiveError::Unreadable {
            path: Some(path.to_path_buf()),
            source,
        })?;
        Ok(Box::new(zip::ZipArchive::new(io::BufReader::new(file))?))
    }
}
