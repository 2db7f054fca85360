//! Raw procfs access for memsum.
//!
//! Every filesystem path under `/proc` is built here and nowhere else; the
//! parsers only ever see decoded text. The root is parameterized so tests
//! can point the whole pipeline at a synthetic tree.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ProcError;

/// Kernel process id; primary key throughout.
pub type Pid = u32;

/// Logical per-process files the reader knows how to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcFile {
    Exe,
    Status,
    Cmdline,
    Statm,
    Smaps,
    SmapsRollup,
    Maps,
}

impl ProcFile {
    fn file_name(self) -> &'static str {
        match self {
            ProcFile::Exe => "exe",
            ProcFile::Status => "status",
            ProcFile::Cmdline => "cmdline",
            ProcFile::Statm => "statm",
            ProcFile::Smaps => "smaps",
            ProcFile::SmapsRollup => "smaps_rollup",
            ProcFile::Maps => "maps",
        }
    }
}

/// Handle to a procfs tree rooted at `/proc` (or a test directory).
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        ProcFs::new("/proc")
    }
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ProcFs { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a single process, e.g. `/proc/1234`.
    pub fn pid_dir(&self, pid: Pid) -> PathBuf {
        self.root.join(pid.to_string())
    }

    /// Read one logical per-process file as text.
    ///
    /// `Exe` is a symlink and is resolved with `read_link`; the returned
    /// string is the link target, not file content. Text is decoded
    /// lossily: procfs values (cmdline, status names) are not guaranteed
    /// to be valid UTF-8.
    pub fn read(&self, pid: Pid, file: ProcFile) -> Result<String, ProcError> {
        let path = self.pid_dir(pid).join(file.file_name());
        match file {
            ProcFile::Exe => fs::read_link(&path)
                .map(|target| target.to_string_lossy().into_owned())
                .map_err(|e| ProcError::from_io(path, e)),
            _ => fs::read(&path)
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .map_err(|e| ProcError::from_io(path, e)),
        }
    }

    /// Admission check used before targeting a pid.
    ///
    /// NotFound and PermissionDenied both mean "not admissible" here; the
    /// distinction only matters for diagnostics on individual reads.
    pub fn pid_exists(&self, pid: Pid) -> bool {
        fs::metadata(self.pid_dir(pid)).is_ok()
    }

    /// Running kernel release string, e.g. `6.1.0-13-amd64`.
    pub fn kernel_release(&self) -> Result<String, ProcError> {
        let path = self.root.join("sys/kernel/osrelease");
        fs::read_to_string(&path).map_err(|e| ProcError::from_io(path, e))
    }

    /// Global legacy memory info (`/proc/meminfo`).
    pub fn meminfo(&self) -> Result<String, ProcError> {
        let path = self.root.join("meminfo");
        fs::read_to_string(&path).map_err(|e| ProcError::from_io(path, e))
    }

    /// All numeric entries of the procfs root, ascending.
    pub fn list_pids(&self) -> Vec<Pid> {
        let mut pids = Vec::new();
        if let Ok(entries) = fs::read_dir(&self.root) {
            for entry in entries.flatten() {
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };
                if !name.chars().all(|c| c.is_ascii_digit()) {
                    continue;
                }
                if let Ok(pid) = name.parse::<Pid>() {
                    pids.push(pid);
                }
            }
        }
        pids.sort_unstable();
        pids
    }
}
