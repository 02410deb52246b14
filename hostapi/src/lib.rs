//! `scripthost-hostapi` — host collaborator interfaces for the sandboxed Lua host.
//!
//! This crate defines everything the sandbox consumes from the embedding
//! application rather than implementing itself:
//!
//! - `FileSystem` trait: the virtual filesystem, sole ingress for script bytes
//! - `FileInfo` / `FileData`: lookup results and file contents
//! - `MemFileSystem`: in-memory `FileSystem` for tests and embedding
//! - `DiskFileSystem`: `FileSystem` rooted at a host directory
//! - `HostReporter` trait: non-fatal diagnostics and the fatal-error sink
//! - `lookup3`: the 32-bit hash primitive behind `hash_random`
//! - `HostError`: collaborator-side error type

pub mod error;
pub mod types;
pub mod path;
pub mod traits;
pub mod mem_fs;
pub mod disk_fs;
pub mod reporter;
pub mod lookup3;

// Re-export commonly used types at the crate root.
pub use error::HostError;
pub use types::{EnumerateFlags, FileData, FileInfo, FileKind};
pub use traits::{FileSystem, HostReporter};
pub use mem_fs::MemFileSystem;
pub use disk_fs::DiskFileSystem;
pub use reporter::TracingReporter;
