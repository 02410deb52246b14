//! Logical path handling for the virtual filesystem.
//!
//! VFS paths are `/`-separated and relative to the filesystem root. A
//! leading `/` is accepted and ignored, `.` segments and repeated
//! separators collapse, and `..` pops a segment but may never climb above
//! the root.

use crate::error::HostError;

/// Normalise a logical path. The root is the empty string.
pub fn normalize_path(path: &str) -> Result<String, HostError> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(HostError::PathEscapesRoot(path.to_string()));
                }
            }
            s => segments.push(s),
        }
    }
    Ok(segments.join("/"))
}

/// Directory part of a normalised path (`""` for root-level entries).
pub fn dir_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Final component of a normalised path.
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Join a child name onto a normalised directory path.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
