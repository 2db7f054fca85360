//! Error taxonomy for memsum.
//!
//! Three layers: `ProcError` for raw procfs access, `LostProcess` for a
//! single process that could not be resolved during a sampling cycle, and
//! `FatalError` for configuration problems that abort before any sampling.

use std::path::PathBuf;

use crate::procfs::Pid;

/// Failure reading or interpreting a procfs entry.
///
/// `NotFound` is the expected outcome for vanished processes and is never
/// fatal at the controller level; `PermissionDenied` is kept distinct for
/// diagnostics but treated like `NotFound` by existence checks.
#[derive(Debug, thiserror::Error)]
pub enum ProcError {
    #[error("{0} does not exist")]
    NotFound(PathBuf),

    #[error("permission denied reading {0}")]
    PermissionDenied(PathBuf),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {what}: {detail}")]
    Malformed { what: &'static str, detail: String },
}

impl ProcError {
    /// Classify an `io::Error` for the given path.
    pub fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ProcError::NotFound(path),
            std::io::ErrorKind::PermissionDenied => ProcError::PermissionDenied(path),
            _ => ProcError::Io { path, source: err },
        }
    }
}

/// Why a single process could not be resolved during one cycle.
///
/// Matched exhaustively at the controller boundary; folded into either the
/// cycle's warning list or dropped after logging, never propagated past it.
#[derive(Debug, thiserror::Error)]
pub enum LostProcess {
    /// Neither the executable link nor the command line gave a usable name.
    #[error("pid {0}: no executable link and empty command line")]
    NoNameSource(Pid),

    /// The status file is gone or lacks a mandatory field.
    #[error("pid {pid}: status record unusable: {detail}")]
    BadStatus { pid: Pid, detail: String },

    /// The memory accounting file disappeared or is unreadable.
    #[error("pid {0}: memory accounting unavailable")]
    MemoryGone(Pid),

    /// Accounting text was present but does not parse.
    #[error("pid {pid}: malformed memory accounting: {detail}")]
    BadAccounting { pid: Pid, detail: String },
}

impl LostProcess {
    pub fn pid(&self) -> Pid {
        match self {
            LostProcess::NoNameSource(pid) => *pid,
            LostProcess::BadStatus { pid, .. } => *pid,
            LostProcess::MemoryGone(pid) => *pid,
            LostProcess::BadAccounting { pid, .. } => *pid,
        }
    }
}

/// Configuration-fatal conditions; abort the run before any sampling.
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error("cannot determine kernel version: {0}")]
    KernelVersion(#[source] ProcError),

    #[error("process {0} does not exist or is not accessible")]
    PidUnreachable(Pid),

    #[error("no processes to report on")]
    NoProcesses,

    #[error("cannot compute an accurate total on this kernel: {0}")]
    InaccurateTotal(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
