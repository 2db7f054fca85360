//! Parsing of the `/proc/<pid>/exe` symlink target.

use std::path::PathBuf;

/// Marker the kernel appends when the executable was removed from disk.
const DELETED_SUFFIX: &str = " (deleted)";

/// Decoded executable reference of a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableInfo {
    /// Link target with the deletion marker stripped.
    pub original_target: PathBuf,
    /// True when the kernel annotated the target as removed.
    pub deleted: bool,
}

/// Parse a raw `exe` symlink target.
///
/// Link targets have been observed to carry embedded NUL bytes; everything
/// from the first NUL on is dropped before interpretation.
pub fn parse_executable_info(raw: &str) -> ExecutableInfo {
    let raw = raw.split('\0').next().unwrap_or("");
    match raw.strip_suffix(DELETED_SUFFIX) {
        Some(stripped) => ExecutableInfo {
            original_target: PathBuf::from(stripped),
            deleted: true,
        },
        None => ExecutableInfo {
            original_target: PathBuf::from(raw),
            deleted: false,
        },
    }
}

impl ExecutableInfo {
    /// Reconstruct the raw link text this value was parsed from.
    pub fn raw_target(&self) -> String {
        let mut raw = self.original_target.to_string_lossy().into_owned();
        if self.deleted {
            raw.push_str(DELETED_SUFFIX);
        }
        raw
    }
}
