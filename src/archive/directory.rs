use crate::archive::errors::{ArchiveError, ArchiveResult};
use crate::archive::Archive;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct DirectoryArchive(PathBuf);

impl DirectoryArchive {
    pub fn new(dir: &Path) -> ArchiveResult<Self> {
        let canonical = dir.canonicalize().map_err(|source| ArchiveError::Unreadable {
            path: Some(dir.to_path_buf()),
            source,
        })?;
        if !canonical.is_dir() {
            return Err(ArchiveError::Unreadable {
                path: Some(dir.to_path_buf()),
                source: std::io::Error::from(std::io::ErrorKind::NotADirectory),
            });
        }
        Ok(Self(canonical))
    }

    fn resolve(&self, path: &str) -> ArchiveResult<PathBuf> {
        let joined = self.0.join(path.trim_start_matches('/'));
        let resolved = joined
            .canonicalize()
            .map_err(|_| ArchiveError::NotFound { path: path.to_owned() })?;

        if resolved.starts_with(&self.0) {
            Ok(resolved)
        } else {
            Err(ArchiveError::PathTraversal { path: path.to_owned() })
        }
    }
}

impl Archive for DirectoryArchive {
    fn read(&self, path: &str) -> ArchiveResult<Vec<u8>> {
        let resolved = self.resolve(path)?;
        fs::read(&resolved).map_err(|source| ArchiveError::Io {
            path: path.to_owned(),
            source,
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }

    fn entries(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect(&self.0, &self.0, &mut out);
        out
    }
}

fn collect(root: &Path, dir: &Path, out: &mut Vec<String>) {
    let Ok(read_dir) = dir.read_dir() else {
        return;
    };

    for entry in read_dir.flatten() {
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        // Path traversal mitigation: never follow a symlink out of `root`.
        if metadata.is_symlink() {
            continue;
        }

        let path = entry.path();
        if metadata.is_dir() {
            collect(root, &path, out);
        } else if let Ok(relative) = path.strip_prefix(root) {
            if let Some(utf8) = relative.to_str() {
                out.push(utf8.replace('\\', "/"));
            }
        }
    }
}
