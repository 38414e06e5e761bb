//! A synthetic one-entry archive for [`Options::single_file_mode`](crate::options::Options),
//! used when the caller wants to validate one content document without a
//! surrounding package. There is no teacher analogue for this mode (the
//! teacher always opens a complete ebook); it is grounded on spec.md §4.M's
//! single-file-mode description and on the `Archive` trait already defined
//! for the two full-archive backends.

use crate::archive::errors::{ArchiveError, ArchiveResult};
use crate::archive::Archive;

/// The archive-relative path single-file-mode documents are addressed
/// under, chosen so checks that report a [`Location`](crate::location::Location)
/// path read sensibly without a real manifest href.
pub const SINGLE_FILE_PATH: &str = "document";

pub struct SingleFileArchive {
    content: Vec<u8>,
}

impl SingleFileArchive {
    pub fn new(content: Vec<u8>) -> Self {
        Self { content }
    }
}

impl Archive for SingleFileArchive {
    fn read(&self, path: &str) -> ArchiveResult<Vec<u8>> {
        if path == SINGLE_FILE_PATH {
            Ok(self.content.clone())
        } else {
            Err(ArchiveError::NotFound { path: path.to_owned() })
        }
    }

    fn exists(&self, path: &str) -> bool {
        path == SINGLE_FILE_PATH
    }

    fn entries(&self) -> Vec<String> {
        vec![SINGLE_FILE_PATH.to_owned()]
    }
}
