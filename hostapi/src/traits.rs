//! Collaborator traits consumed by the sandbox.
//!
//! The sandbox never touches the host filesystem or process directly. Script
//! bytes arrive only through a `FileSystem`, and every diagnostic or fatal
//! condition is handed to a `HostReporter`.

use crate::types::{EnumerateFlags, FileData, FileInfo};

/// Virtual filesystem, the sole ingress for script bytes.
///
/// Implementations take logical `/`-separated paths. Paths that cannot be
/// normalised (for example ones escaping the root with `..`) behave as if
/// they do not exist.
pub trait FileSystem: Send + Sync {
    /// Describe what `path` refers to.
    fn lookup(&self, path: &str) -> FileInfo;

    /// Read a regular file. Returns `None` if it is missing or unreadable.
    fn read_file(&self, path: &str) -> Option<FileData>;

    /// List the entries under `path`, sorted by path.
    ///
    /// Without `flags.recurse` only direct children are listed. Directories
    /// are included only when `flags.include_dirs` is set.
    fn enumerate(&self, path: &str, flags: EnumerateFlags) -> Vec<FileInfo>;

    /// Read the file an enumeration or lookup step described.
    fn read(&self, info: &FileInfo) -> Option<FileData> {
        self.read_file(info.path())
    }
}

/// Host logger and fatal-error sink.
pub trait HostReporter: Send + Sync {
    /// Emit one non-fatal diagnostic line.
    fn diagnostic(&self, line: &str);

    /// Report an unrecoverable error. Never returns.
    fn fatal(&self, message: &str) -> !;
}
