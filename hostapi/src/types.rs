//! Virtual filesystem value types.
//!
//! `FileInfo` is the result of a lookup or an enumeration step; `FileData`
//! carries the bytes of one file for the duration of a single load.

use crate::path;

/// What a VFS path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Dir,
    /// Exists but is neither a regular file nor a directory.
    Special,
    NonExistent,
}

/// Metadata for a single VFS path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    kind: FileKind,
    path: String,
    absolute_path: String,
}

impl FileInfo {
    /// Create info for a normalised logical `path`.
    ///
    /// `absolute_path` is whatever the backing store uses to name the entry
    /// in host-facing diagnostics.
    pub fn new(kind: FileKind, path: impl Into<String>, absolute_path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            absolute_path: absolute_path.into(),
        }
    }

    /// Info for a path that does not exist.
    pub fn non_existent(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            kind: FileKind::NonExistent,
            absolute_path: path.clone(),
            path,
        }
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn exists(&self) -> bool {
        self.kind != FileKind::NonExistent
    }

    /// Logical path relative to the filesystem root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Directory containing this entry (`""` at the root).
    pub fn dir(&self) -> &str {
        path::dir_of(&self.path)
    }

    /// Final path component.
    pub fn name(&self) -> &str {
        path::file_name(&self.path)
    }

    pub fn absolute_path(&self) -> &str {
        &self.absolute_path
    }
}

/// Contents of one file read through the VFS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileData {
    info: FileInfo,
    data: Vec<u8>,
}

impl FileData {
    pub fn new(info: FileInfo, data: Vec<u8>) -> Self {
        Self { info, data }
    }

    pub fn info(&self) -> &FileInfo {
        &self.info
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Options for `FileSystem::enumerate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnumerateFlags {
    /// Yield directory entries as well as files.
    pub include_dirs: bool,
    /// Descend into subdirectories.
    pub recurse: bool,
}

impl EnumerateFlags {
    /// Direct children, directories included. What the recursive loader uses.
    pub const INCLUDE_DIRS: Self = Self {
        include_dirs: true,
        recurse: false,
    };
}
