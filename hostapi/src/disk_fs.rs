//! Virtual filesystem rooted at a host directory.
//!
//! Every logical path is normalised before it is joined onto the root, so
//! `..` can never reach outside it. Symbolic links are never followed: a
//! link as the final component is `FileKind::Special`, and anything below
//! a linked directory does not exist.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::HostError;
use crate::path::{self, normalize_path};
use crate::traits::FileSystem;
use crate::types::{EnumerateFlags, FileData, FileInfo, FileKind};

/// `FileSystem` over a directory on the host.
#[derive(Debug, Clone)]
pub struct DiskFileSystem {
    root: PathBuf,
}

impl DiskFileSystem {
    /// Create a filesystem rooted at `root`, which must be a directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, HostError> {
        let root = root.into();
        let meta = fs::metadata(&root).map_err(|e| HostError::io(root.display().to_string(), e))?;
        if !meta.is_dir() {
            return Err(HostError::NotFound(root.display().to_string()));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn host_path(&self, logical: &str) -> PathBuf {
        if logical.is_empty() {
            self.root.clone()
        } else {
            self.root.join(logical)
        }
    }

    /// Classify `logical` one component at a time so no intermediate
    /// symlink is traversed.
    fn kind_of(&self, logical: &str) -> FileKind {
        let parts: Vec<&str> = logical.split('/').filter(|p| !p.is_empty()).collect();
        let Some((last, parents)) = parts.split_last() else {
            return match fs::metadata(&self.root) {
                Ok(meta) if meta.is_dir() => FileKind::Dir,
                _ => FileKind::NonExistent,
            };
        };

        let mut host = self.root.clone();
        for part in parents {
            host.push(part);
            match fs::symlink_metadata(&host) {
                Ok(meta) if meta.is_dir() && !meta.file_type().is_symlink() => {}
                _ => return FileKind::NonExistent,
            }
        }

        host.push(last);
        match fs::symlink_metadata(&host) {
            Ok(meta) if meta.file_type().is_symlink() => FileKind::Special,
            Ok(meta) if meta.is_dir() => FileKind::Dir,
            Ok(meta) if meta.is_file() => FileKind::File,
            Ok(_) => FileKind::Special,
            Err(_) => FileKind::NonExistent,
        }
    }

    fn info_for(&self, logical: &str) -> FileInfo {
        let host = self.host_path(logical);
        FileInfo::new(self.kind_of(logical), logical, host.display().to_string())
    }

    fn collect(&self, dir: &str, flags: EnumerateFlags, out: &mut Vec<FileInfo>) {
        let entries = match fs::read_dir(self.host_path(dir)) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(dir, %err, "cannot enumerate directory");
                return;
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        names.sort();

        for name in names {
            let info = self.info_for(&path::join(dir, &name));
            match info.kind() {
                FileKind::Dir => {
                    let child = info.path().to_string();
                    if flags.include_dirs {
                        out.push(info);
                    }
                    if flags.recurse {
                        self.collect(&child, flags, out);
                    }
                }
                FileKind::NonExistent => {}
                _ => out.push(info),
            }
        }
    }
}

impl FileSystem for DiskFileSystem {
    fn lookup(&self, path: &str) -> FileInfo {
        match normalize_path(path) {
            Ok(logical) => self.info_for(&logical),
            Err(_) => FileInfo::non_existent(path),
        }
    }

    fn read_file(&self, path: &str) -> Option<FileData> {
        let info = self.lookup(path);
        if !info.is_file() {
            return None;
        }
        match fs::read(self.host_path(info.path())) {
            Ok(data) => Some(FileData::new(info, data)),
            Err(err) => {
                tracing::debug!(path = info.path(), %err, "cannot read file");
                None
            }
        }
    }

    fn enumerate(&self, path: &str, flags: EnumerateFlags) -> Vec<FileInfo> {
        let Ok(logical) = normalize_path(path) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if self.info_for(&logical).is_dir() {
            self.collect(&logical, flags, &mut out);
        }
        out
    }
}
