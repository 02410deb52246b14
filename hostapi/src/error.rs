//! Host-side error types for the virtual filesystem collaborator.
//!
//! `HostError` never crosses into guest code directly; the sandbox maps it
//! to a diagnostic or a guest-visible runtime error at the boundary.

use thiserror::Error;

/// Errors produced by `FileSystem` implementations and path handling.
#[derive(Debug, Error)]
pub enum HostError {
    /// The path does not name anything in the filesystem.
    #[error("path not found: {0}")]
    NotFound(String),

    /// The path exists but is not a regular file.
    #[error("not a regular file: {0}")]
    NotAFile(String),

    /// The path tries to climb above the filesystem root with `..`.
    #[error("path escapes filesystem root: {0}")]
    PathEscapesRoot(String),

    /// Underlying host I/O failure.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl HostError {
    /// Wrap an `io::Error` with the logical path it happened on.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
