//! In-memory virtual filesystem.
//!
//! `MemFileSystem` keeps files in a `BTreeMap` so enumeration order is
//! deterministic. Directories are implied by the files beneath them and
//! can also be created explicitly so that empty directories exist.

use std::collections::{BTreeMap, BTreeSet};

use crate::path::{self, normalize_path};
use crate::traits::FileSystem;
use crate::types::{EnumerateFlags, FileData, FileInfo, FileKind};

/// In-memory `FileSystem` backed by `BTreeMap`.
#[derive(Debug, Clone, Default)]
pub struct MemFileSystem {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

impl MemFileSystem {
    /// Create a new empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file. Invalid paths are ignored.
    pub fn insert(&mut self, path: &str, contents: impl Into<Vec<u8>>) {
        let Ok(path) = normalize_path(path) else {
            return;
        };
        if path.is_empty() {
            return;
        }
        self.add_parents(&path);
        self.files.insert(path, contents.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Create a directory (and its parents). Invalid paths are ignored.
    pub fn create_dir(&mut self, path: &str) {
        let Ok(path) = normalize_path(path) else {
            return;
        };
        if path.is_empty() {
            return;
        }
        self.add_parents(&path);
        self.dirs.insert(path);
    }

    /// Remove a file.
    pub fn remove(&mut self, path: &str) {
        if let Ok(path) = normalize_path(path) {
            self.files.remove(&path);
        }
    }

    /// Number of files stored.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn add_parents(&mut self, path: &str) {
        let mut dir = path::dir_of(path);
        while !dir.is_empty() {
            if !self.dirs.insert(dir.to_string()) {
                break;
            }
            dir = path::dir_of(dir);
        }
    }

    fn kind_of(&self, path: &str) -> FileKind {
        if path.is_empty() || self.dirs.contains(path) {
            FileKind::Dir
        } else if self.files.contains_key(path) {
            FileKind::File
        } else {
            FileKind::NonExistent
        }
    }

    fn collect(&self, dir: &str, flags: EnumerateFlags, out: &mut Vec<FileInfo>) {
        let children = self
            .dirs
            .iter()
            .map(|d| (d, FileKind::Dir))
            .chain(self.files.keys().map(|f| (f, FileKind::File)))
            .filter(|(p, _)| path::dir_of(p) == dir);

        let mut entries: Vec<(&String, FileKind)> = children.collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        for (child, kind) in entries {
            if kind == FileKind::Dir {
                if flags.include_dirs {
                    out.push(FileInfo::new(kind, child.as_str(), child.as_str()));
                }
                if flags.recurse {
                    self.collect(child, flags, out);
                }
            } else {
                out.push(FileInfo::new(kind, child.as_str(), child.as_str()));
            }
        }
    }
}

impl FileSystem for MemFileSystem {
    fn lookup(&self, path: &str) -> FileInfo {
        match normalize_path(path) {
            Ok(path) => {
                let kind = self.kind_of(&path);
                FileInfo::new(kind, path.as_str(), path.as_str())
            }
            Err(_) => FileInfo::non_existent(path),
        }
    }

    fn read_file(&self, path: &str) -> Option<FileData> {
        let path = normalize_path(path).ok()?;
        let data = self.files.get(&path)?;
        let info = FileInfo::new(FileKind::File, path.as_str(), path.as_str());
        Some(FileData::new(info, data.clone()))
    }

    fn enumerate(&self, path: &str, flags: EnumerateFlags) -> Vec<FileInfo> {
        let Ok(path) = normalize_path(path) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if self.kind_of(&path) == FileKind::Dir {
            self.collect(&path, flags, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemFileSystem {
        MemFileSystem::new()
            .with_file("data/ui/a.lua", "x = 1")
            .with_file("data/ui/sub/b.lua", "y = 2")
            .with_file("data/ui/README", "docs")
            .with_file("init.lua", "")
    }

    #[test]
    fn test_empty_fs() {
        let fs = MemFileSystem::new();
        assert!(fs.is_empty());
        assert!(fs.read_file("a.lua").is_none());
        assert!(fs.lookup("").is_dir());
        assert!(!fs.lookup("a.lua").exists());
    }

    #[test]
    fn test_lookup_kinds() {
        let fs = sample();
        assert!(fs.lookup("data/ui/a.lua").is_file());
        assert!(fs.lookup("data/ui").is_dir());
        assert!(fs.lookup("data").is_dir());
        assert!(!fs.lookup("data/ui/missing.lua").exists());
        assert!(!fs.lookup("../escape").exists());
    }

    #[test]
    fn test_read_file() {
        let fs = sample();
        let data = fs.read_file("/data/ui/./a.lua").unwrap();
        assert_eq!(data.data(), b"x = 1");
        assert_eq!(data.info().path(), "data/ui/a.lua");
        assert_eq!(data.info().dir(), "data/ui");
        assert!(fs.read_file("data/ui").is_none());
    }

    #[test]
    fn test_enumerate_direct_children_with_dirs() {
        let fs = sample();
        let paths: Vec<String> = fs
            .enumerate("data/ui", EnumerateFlags::INCLUDE_DIRS)
            .iter()
            .map(|i| i.path().to_string())
            .collect();
        assert_eq!(paths, vec!["data/ui/README", "data/ui/a.lua", "data/ui/sub"]);
    }

    #[test]
    fn test_enumerate_files_only_recursive() {
        let fs = sample();
        let flags = EnumerateFlags {
            include_dirs: false,
            recurse: true,
        };
        let paths: Vec<String> = fs
            .enumerate("data", flags)
            .iter()
            .map(|i| i.path().to_string())
            .collect();
        assert_eq!(
            paths,
            vec!["data/ui/README", "data/ui/a.lua", "data/ui/sub/b.lua"]
        );
    }

    #[test]
    fn test_enumerate_root_and_missing() {
        let fs = sample();
        let root: Vec<String> = fs
            .enumerate("", EnumerateFlags::INCLUDE_DIRS)
            .iter()
            .map(|i| i.path().to_string())
            .collect();
        assert_eq!(root, vec!["data", "init.lua"]);
        assert!(fs.enumerate("nope", EnumerateFlags::INCLUDE_DIRS).is_empty());
        assert!(fs.enumerate("init.lua", EnumerateFlags::INCLUDE_DIRS).is_empty());
    }

    #[test]
    fn test_empty_dir_and_remove() {
        let mut fs = sample();
        fs.create_dir("data/empty");
        assert!(fs.lookup("data/empty").is_dir());
        assert!(fs.enumerate("data/empty", EnumerateFlags::INCLUDE_DIRS).is_empty());

        fs.remove("init.lua");
        assert!(!fs.lookup("init.lua").exists());
        assert_eq!(fs.len(), 3);
    }
}
