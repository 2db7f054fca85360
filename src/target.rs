//! The immutable per-run `Target` descriptor.
//!
//! Built exactly once per invocation by probing the kernel and one
//! representative process, then passed by reference to every stage; never
//! mutated, never a singleton.

use tracing::debug;

use crate::error::FatalError;
use crate::kernel::{classify_flaws, Capabilities, KernelVersion, RamFlaw, SwapFlaw};
use crate::procfs::{Pid, ProcFile, ProcFs};

/// Everything a sampling cycle needs to know about the environment.
#[derive(Debug, Clone)]
pub struct Target {
    /// Process ids to sample; non-empty, fixed for the run.
    pub pids: Vec<Pid>,
    pub kernel: KernelVersion,
    pub has_smaps: bool,
    pub has_pss: bool,
    pub has_swap_pss: bool,
    pub ram_flaw: Option<RamFlaw>,
    pub swap_flaw: Option<SwapFlaw>,
}

impl Target {
    /// Probe the kernel and one representative process, once.
    ///
    /// The representative is the first pid whose detailed accounting file
    /// is readable; `smaps_rollup` is preferred over `smaps` as the
    /// cheaper read.
    pub fn probe(procfs: &ProcFs, pids: Vec<Pid>) -> Result<Target, FatalError> {
        if pids.is_empty() {
            return Err(FatalError::NoProcesses);
        }

        let release = procfs
            .kernel_release()
            .map_err(FatalError::KernelVersion)?;
        let kernel = KernelVersion::parse(&release);

        let mut caps = Capabilities::default();
        for &pid in &pids {
            let detailed = procfs
                .read(pid, ProcFile::SmapsRollup)
                .or_else(|_| procfs.read(pid, ProcFile::Smaps));
            if let Ok(text) = detailed {
                caps.has_smaps = true;
                caps.has_pss = text.lines().any(|l| l.starts_with("Pss:"));
                caps.has_swap_pss = text.lines().any(|l| l.starts_with("SwapPss:"));
                break;
            }
        }

        // The legacy meminfo probe only informs the 2.4.x branch.
        let legacy_inactive = if kernel.major == 2 && kernel.minor == 4 {
            procfs
                .meminfo()
                .map(|text| text.lines().any(|l| l.starts_with("Inact_")))
                .unwrap_or(false)
        } else {
            false
        };

        let (ram_flaw, swap_flaw) = classify_flaws(kernel, &caps, legacy_inactive);

        debug!(
            kernel = %kernel,
            has_smaps = caps.has_smaps,
            has_pss = caps.has_pss,
            has_swap_pss = caps.has_swap_pss,
            ?ram_flaw,
            ?swap_flaw,
            "capability probe complete"
        );

        Ok(Target {
            pids,
            kernel,
            has_smaps: caps.has_smaps,
            has_pss: caps.has_pss,
            has_swap_pss: caps.has_swap_pss,
            ram_flaw,
            swap_flaw,
        })
    }

    /// Whether the compact format's shared column means anything on this
    /// kernel (see the memory parser).
    pub fn statm_shared_tracked(&self) -> bool {
        self.ram_flaw != Some(RamFlaw::NoSharedReported)
    }
}
