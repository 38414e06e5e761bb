use crate::archive::errors::{ArchiveError, ArchiveResult};
use crate::archive::{Archive, ZipEntryInfo};
use std::io::{self, Read, Seek};
use std::sync::Mutex;
use zip::CompressionMethod;
use zip::ZipArchive as Zip;

pub struct ZipArchive<R>(Mutex<Zip<R>>);

impl<R: Read + Seek> ZipArchive<R> {
    pub fn new(reader: R) -> ArchiveResult<Self> {
        Zip::new(reader)
            .map(|zip| Self(Mutex::new(zip)))
            .map_err(|error| ArchiveError::Unreadable {
                path: None,
                source: io::Error::from(error),
            })
    }

    fn poisoned(path: &str) -> ArchiveError {
        ArchiveError::Io {
            path: path.to_owned(),
            source: io::Error::other("archive lock poisoned"),
        }
    }
}

impl<R: Read + Seek + Send> Archive for ZipArchive<R> {
    fn read(&self, path: &str) -> ArchiveResult<Vec<u8>> {
        let mut zip = self.0.lock().map_err(|_| Self::poisoned(path))?;
        let mut entry = zip
            .by_name(path)
            .map_err(|_| ArchiveError::NotFound { path: path.to_owned() })?;

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|source| ArchiveError::Io { path: path.to_owned(), source })?;
        Ok(bytes)
    }

    fn exists(&self, path: &str) -> bool {
        self.0
            .lock()
            .map(|mut zip| zip.by_name(path).is_ok())
            .unwrap_or(false)
    }

    fn entries(&self) -> Vec<String> {
        let Ok(zip) = self.0.lock() else {
            return Vec::new();
        };
        zip.file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_owned)
            .collect()
    }

    fn zip_entry_info(&self, path: &str) -> Option<ZipEntryInfo> {
        let mut zip = self.0.lock().ok()?;
        let names: Vec<String> = zip.file_names().map(str::to_owned).collect();
        let ordinal = names.iter().position(|name| name == path)?;
        let entry = zip.by_name(path).ok()?;

        Some(ZipEntryInfo {
            ordinal,
            stored: entry.compression() == CompressionMethod::Stored,
            extra_field_len: entry.extra_data().len() as u16,
        })
    }
}
