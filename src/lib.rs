//! memsum - accurate, de-duplicated memory usage reporting for Linux.
//!
//! Summing RSS across processes double-counts everything they share. This
//! crate reads per-process memory accounting from procfs, prefers
//! proportional-share (Pss/SwapPss) figures where the kernel provides
//! them, compensates for older kernels' accounting gaps, and aggregates
//! the result into per-program totals with known accuracy limitations
//! reported rather than hidden.
//!
//! Pipeline: [`target::Target::probe`] runs once to detect kernel
//! capabilities; per pid, [`process::name`] and [`process::memory`]
//! resolve independently; [`aggregate`] folds the pairs into totals;
//! [`poll`] drives the whole thing once or on a fixed period.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod kernel;
pub mod poll;
pub mod procfs;
pub mod process;
pub mod report;
pub mod target;

// Re-export the types most callers need
pub use aggregate::{aggregate, CommandTotal, GroupKey};
pub use error::{FatalError, LostProcess, ProcError};
pub use kernel::{KernelVersion, RamFlaw, SwapFlaw};
pub use procfs::{Pid, ProcFile, ProcFs};
pub use process::memory::MemoryRecord;
pub use process::name::NameStrategy;
pub use target::Target;
