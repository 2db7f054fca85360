//! Stable display-name resolution for processes.
//!
//! The executable base name is the preferred name. When the executable
//! link is unusable or points at a deleted file, the command line steps in
//! with an `[updated]` / `[deleted]` marker. Worker processes whose
//! executable path differs from their logical program name fold into the
//! parent's name when the parent resolves identically.

use std::path::Path;

use crate::error::LostProcess;
use crate::procfs::{Pid, ProcFile, ProcFs};
use crate::process::exe::parse_executable_info;
use crate::process::status::parse_status_info;

/// How processes are keyed for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStrategy {
    /// Executable base name with parent-name folding.
    Basename,
    /// Raw command line, no folding.
    FullCmdline,
}

/// Resolve the display name of `pid` under the given strategy.
pub fn resolve_display_name(
    procfs: &ProcFs,
    pid: Pid,
    strategy: NameStrategy,
) -> Result<String, LostProcess> {
    let cmdline = read_cmdline(procfs, pid);

    if strategy == NameStrategy::FullCmdline {
        if cmdline.is_empty() {
            return Err(LostProcess::NoNameSource(pid));
        }
        return Ok(cmdline.join(" "));
    }

    let candidate = resolve_candidate(procfs, pid, &cmdline)?;

    let status_text = procfs
        .read(pid, ProcFile::Status)
        .map_err(|e| LostProcess::BadStatus {
            pid,
            detail: e.to_string(),
        })?;
    let status = parse_status_info(&status_text).map_err(|e| LostProcess::BadStatus {
        pid,
        detail: e.to_string(),
    })?;

    // The status name is truncated by the kernel; a candidate it prefixes
    // is the same program under its full name.
    if candidate.starts_with(&status.name) {
        return Ok(candidate);
    }

    // Worker processes often exec a helper path while the parent carries
    // the canonical program name. Fold only when the parent resolves to
    // the exact same candidate.
    if status.parent != 0 {
        let parent_cmdline = read_cmdline(procfs, status.parent);
        if let Ok(parent_candidate) = resolve_candidate(procfs, status.parent, &parent_cmdline) {
            if parent_candidate == candidate {
                return Ok(candidate);
            }
        }
    }

    Ok(status.name)
}

/// Candidate name from the executable link, falling back to the command
/// line; no parent folding.
fn resolve_candidate(
    procfs: &ProcFs,
    pid: Pid,
    cmdline: &[String],
) -> Result<String, LostProcess> {
    let path = match procfs.read(pid, ProcFile::Exe) {
        Ok(raw) => {
            let info = parse_executable_info(&raw);
            let original = info.original_target.to_string_lossy().into_owned();
            if info.deleted {
                if info.original_target.exists() {
                    // Prelink or a package upgrade rewrote the file in place.
                    format!("{original} [updated]")
                } else if let Some(first) = cmdline.first().filter(|p| Path::new(p).exists()) {
                    format!("{first} [updated]")
                } else {
                    format!("{original} [deleted]")
                }
            } else {
                original
            }
        }
        // Kernel threads and permission-restricted processes have no
        // readable exe link.
        Err(_) => cmdline
            .first()
            .cloned()
            .ok_or(LostProcess::NoNameSource(pid))?,
    };

    Ok(base_name(&path))
}

/// NUL-separated command line, trailing empties dropped. A missing or
/// empty cmdline yields an empty vector, not an error.
fn read_cmdline(procfs: &ProcFs, pid: Pid) -> Vec<String> {
    let Ok(raw) = procfs.read(pid, ProcFile::Cmdline) else {
        return Vec::new();
    };
    let mut args: Vec<String> = raw.split('\0').map(str::to_string).collect();
    while args.last().is_some_and(|a| a.is_empty()) {
        args.pop();
    }
    args
}

/// Final path component; `[updated]` / `[deleted]` markers survive.
fn base_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}
