//! The polling controller: single-shot and fixed-period sampling.
//!
//! A cycle resolves name and memory for every pid in the original target
//! set, partitions the outcomes, aggregates the successes and hands them
//! to the report sink. The repeating mode is an explicit two-state loop:
//! it keeps sampling the same set (a process that failed once is retried
//! next cycle) and terminates only when an entire cycle resolves nothing.

use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::aggregate::{aggregate, CommandTotal, GroupKey};
use crate::error::{LostProcess, ProcError};
use crate::procfs::{Pid, ProcFile, ProcFs};
use crate::process::memory::{parse_smaps, parse_statm, MemoryRecord, PAGE_SIZE_KB};
use crate::process::name::{resolve_display_name, NameStrategy};
use crate::report::ReportSink;
use crate::target::Target;

/// Per-run sampling options.
#[derive(Debug, Clone, Copy)]
pub struct SampleOptions {
    pub strategy: NameStrategy,
    /// Key results by `(pid, name)` instead of command name.
    pub by_pid: bool,
}

/// Result of one sampling cycle.
#[derive(Debug)]
pub struct CycleOutcome {
    pub totals: Vec<(GroupKey, CommandTotal)>,
    pub lost: Vec<LostProcess>,
    /// Processes that resolved successfully this cycle.
    pub resolved: usize,
}

/// Controller states; the only exit condition is a cycle with zero
/// successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollState {
    Sampling,
    Terminated,
}

/// Read and normalize the memory accounting of one process, choosing the
/// source the target's capabilities allow.
fn read_memory(procfs: &ProcFs, target: &Target, pid: Pid) -> Result<MemoryRecord, LostProcess> {
    if target.has_smaps {
        let text = match procfs.read(pid, ProcFile::SmapsRollup) {
            Ok(text) => text,
            Err(_) => procfs
                .read(pid, ProcFile::Smaps)
                .map_err(|e| memory_lost(pid, e))?,
        };
        parse_smaps(&text).map_err(|e| memory_lost(pid, e))
    } else {
        let text = procfs
            .read(pid, ProcFile::Statm)
            .map_err(|e| memory_lost(pid, e))?;
        parse_statm(&text, *PAGE_SIZE_KB, target.statm_shared_tracked())
            .map_err(|e| memory_lost(pid, e))
    }
}

fn memory_lost(pid: Pid, err: ProcError) -> LostProcess {
    match err {
        ProcError::Malformed { .. } => LostProcess::BadAccounting {
            pid,
            detail: err.to_string(),
        },
        _ => LostProcess::MemoryGone(pid),
    }
}

/// Run one sampling cycle over the target's full pid set.
///
/// Per-process resolution is independent; failures are collected, never
/// propagated past the cycle boundary.
pub fn sample_cycle(procfs: &ProcFs, target: &Target, opts: &SampleOptions) -> CycleOutcome {
    let mut pairs: Vec<(GroupKey, MemoryRecord)> = Vec::new();
    let mut lost: Vec<LostProcess> = Vec::new();

    for &pid in &target.pids {
        let resolved = resolve_display_name(procfs, pid, opts.strategy)
            .and_then(|name| read_memory(procfs, target, pid).map(|record| (name, record)));
        match resolved {
            Ok((name, record)) => {
                let key = if opts.by_pid {
                    GroupKey::by_pid(name, pid)
                } else {
                    GroupKey::by_name(name)
                };
                pairs.push((key, record));
            }
            Err(failure) => lost.push(failure),
        }
    }

    let resolved = pairs.len();
    let totals = aggregate(&pairs, target.has_pss);
    CycleOutcome {
        totals,
        lost,
        resolved,
    }
}

/// Single-shot mode: one cycle, then stop.
///
/// Failures are excluded from the totals; they are surfaced at debug level
/// only, the availability machinery having already warned at startup.
pub fn run_once(
    procfs: &ProcFs,
    target: &Target,
    opts: &SampleOptions,
    sink: &mut dyn ReportSink,
) -> CycleOutcome {
    let outcome = sample_cycle(procfs, target, opts);
    for failure in &outcome.lost {
        debug!("excluded from totals: {failure}");
    }
    sink.cycle(&outcome.totals, target);
    outcome
}

/// Repeating mode: sample the same original pid set on a fixed period
/// until a cycle resolves nothing.
pub fn run_repeating(
    procfs: &ProcFs,
    target: &Target,
    opts: &SampleOptions,
    period: Duration,
    sink: &mut dyn ReportSink,
) {
    let mut state = PollState::Sampling;
    while state == PollState::Sampling {
        let outcome = sample_cycle(procfs, target, opts);
        if outcome.resolved == 0 {
            sink.terminated();
            state = PollState::Terminated;
        } else {
            if !outcome.lost.is_empty() {
                sink.lost(&outcome.lost);
            }
            sink.cycle(&outcome.totals, target);
            thread::sleep(period);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::KernelVersion;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_process(root: &Path, pid: Pid, name: &str, rollup: &str) {
        let dir = root.join(pid.to_string());
        fs::create_dir_all(&dir).unwrap();
        std::os::unix::fs::symlink(format!("/usr/bin/{name}"), dir.join("exe")).unwrap();
        fs::write(dir.join("cmdline"), format!("/usr/bin/{name}\0")).unwrap();
        fs::write(dir.join("status"), format!("Name:\t{name}\nPPid:\t1\n")).unwrap();
        fs::write(dir.join("smaps_rollup"), rollup).unwrap();
    }

    fn modern_target(pids: Vec<Pid>) -> Target {
        Target {
            pids,
            kernel: KernelVersion::new(6, 1, 0),
            has_smaps: true,
            has_pss: true,
            has_swap_pss: true,
            ram_flaw: None,
            swap_flaw: None,
        }
    }

    const ROLLUP: &str = "Pss:                  40 kB\nPrivate_Clean:        10 kB\nPrivate_Dirty:        20 kB\nSwapPss:               4 kB\n";

    #[test]
    fn test_sample_cycle_partitions_successes_and_losses() {
        let dir = tempdir().unwrap();
        let procfs = ProcFs::new(dir.path());
        write_process(dir.path(), 1, "init", ROLLUP);
        write_process(dir.path(), 2, "cron", ROLLUP);
        // pid 3 never existed

        let target = modern_target(vec![1, 2, 3]);
        let opts = SampleOptions {
            strategy: NameStrategy::Basename,
            by_pid: false,
        };
        let outcome = sample_cycle(&procfs, &target, &opts);

        assert_eq!(outcome.resolved, 2);
        assert_eq!(outcome.lost.len(), 1);
        assert_eq!(outcome.lost[0].pid(), 3);
        assert_eq!(outcome.totals.len(), 2);
    }

    #[test]
    fn test_sample_cycle_falls_back_to_full_smaps() {
        let dir = tempdir().unwrap();
        let procfs = ProcFs::new(dir.path());
        write_process(dir.path(), 1, "init", ROLLUP);
        fs::remove_file(dir.path().join("1/smaps_rollup")).unwrap();
        fs::write(
            dir.path().join("1/smaps"),
            "Private_Dirty:        32 kB\nShared_Clean:          8 kB\n",
        )
        .unwrap();

        let mut target = modern_target(vec![1]);
        target.has_pss = false;
        target.has_swap_pss = false;
        let opts = SampleOptions {
            strategy: NameStrategy::Basename,
            by_pid: false,
        };
        let outcome = sample_cycle(&procfs, &target, &opts);
        assert_eq!(outcome.resolved, 1);
        assert_eq!(outcome.totals[0].1.private_kb, 32);
        assert_eq!(outcome.totals[0].1.shared_kb, 8);
    }

    #[test]
    fn test_malformed_accounting_is_lost_not_zeroed() {
        let dir = tempdir().unwrap();
        let procfs = ProcFs::new(dir.path());
        write_process(dir.path(), 1, "init", "Private_Dirty:       bad kB\n");

        let target = modern_target(vec![1]);
        let opts = SampleOptions {
            strategy: NameStrategy::Basename,
            by_pid: false,
        };
        let outcome = sample_cycle(&procfs, &target, &opts);
        assert_eq!(outcome.resolved, 0);
        assert!(matches!(
            outcome.lost[0],
            LostProcess::BadAccounting { pid: 1, .. }
        ));
    }

    // -------------------------------------------------------------------------
    // Polling state machine
    // -------------------------------------------------------------------------

    /// Sink that records events and removes process directories between
    /// cycles to simulate vanishing processes.
    struct VanishingSink {
        root: std::path::PathBuf,
        remove_after_cycle: Vec<Vec<Pid>>,
        cycles: Vec<Vec<(String, u32)>>,
        lost_pids: Vec<Vec<Pid>>,
        terminated: bool,
    }

    impl ReportSink for VanishingSink {
        fn cycle(&mut self, totals: &[(GroupKey, CommandTotal)], _target: &Target) {
            self.cycles.push(
                totals
                    .iter()
                    .map(|(k, t)| (k.name.clone(), t.count))
                    .collect(),
            );
            if let Some(victims) = self.remove_after_cycle.get(self.cycles.len() - 1) {
                for pid in victims {
                    let _ = fs::remove_dir_all(self.root.join(pid.to_string()));
                }
            }
        }

        fn lost(&mut self, lost: &[LostProcess]) {
            self.lost_pids.push(lost.iter().map(|l| l.pid()).collect());
        }

        fn terminated(&mut self) {
            self.terminated = true;
        }
    }

    #[test]
    fn test_repeating_mode_tolerates_vanishing_then_terminates() {
        let dir = tempdir().unwrap();
        let procfs = ProcFs::new(dir.path());
        for pid in [1, 2, 3] {
            write_process(dir.path(), pid, &format!("proc{pid}"), ROLLUP);
        }

        let target = modern_target(vec![1, 2, 3]);
        let opts = SampleOptions {
            strategy: NameStrategy::Basename,
            by_pid: false,
        };
        let mut sink = VanishingSink {
            root: dir.path().to_path_buf(),
            // cycle 1: all resolve, then pid 2 vanishes
            // cycle 2: {1,3} resolve, then the rest vanish
            // cycle 3: zero successes -> terminated
            remove_after_cycle: vec![vec![2], vec![1, 3]],
            cycles: Vec::new(),
            lost_pids: Vec::new(),
            terminated: false,
        };

        run_repeating(&procfs, &target, &opts, Duration::ZERO, &mut sink);

        assert_eq!(sink.cycles.len(), 2);
        assert_eq!(sink.cycles[0].len(), 3);
        assert_eq!(sink.cycles[1].len(), 2);
        // the warning names exactly the vanished pid
        assert_eq!(sink.lost_pids, vec![vec![2]]);
        assert!(sink.terminated);
    }

    #[test]
    fn test_single_shot_reaches_terminal_state_after_one_cycle() {
        let dir = tempdir().unwrap();
        let procfs = ProcFs::new(dir.path());
        write_process(dir.path(), 1, "init", ROLLUP);

        let target = modern_target(vec![1]);
        let opts = SampleOptions {
            strategy: NameStrategy::Basename,
            by_pid: false,
        };
        let mut sink = VanishingSink {
            root: dir.path().to_path_buf(),
            remove_after_cycle: vec![],
            cycles: Vec::new(),
            lost_pids: Vec::new(),
            terminated: false,
        };

        let outcome = run_once(&procfs, &target, &opts, &mut sink);
        assert_eq!(outcome.resolved, 1);
        assert_eq!(sink.cycles.len(), 1);
        assert!(!sink.terminated);
    }
}
