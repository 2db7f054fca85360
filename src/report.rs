//! Report output for memsum.
//!
//! The polling controller hands aggregated totals to a [`ReportSink`]; the
//! console implementation renders the classic three-column table. Accuracy
//! advisories and per-cycle diagnostics go through `tracing`, the table
//! itself goes to stdout untouched.

use tracing::{info, warn};

use crate::aggregate::{CommandTotal, GroupKey};
use crate::error::LostProcess;
use crate::target::Target;

/// External-printer contract consumed by the polling controller.
pub trait ReportSink {
    /// One sampling cycle's aggregated totals, in aggregation order.
    fn cycle(&mut self, totals: &[(GroupKey, CommandTotal)], target: &Target);

    /// Processes that failed to resolve this cycle.
    fn lost(&mut self, lost: &[LostProcess]);

    /// All target processes are gone; the run is over.
    fn terminated(&mut self);
}

/// Console table renderer.
pub struct ConsoleReport {
    show_swap: bool,
    total_only: bool,
}

impl ConsoleReport {
    pub fn new(show_swap: bool, total_only: bool) -> Self {
        ConsoleReport {
            show_swap,
            total_only,
        }
    }

    /// Emit the accuracy advisories for this target, once at startup.
    pub fn advisories(target: &Target, show_swap: bool) {
        if let Some(flaw) = target.ram_flaw {
            warn!("RAM accounting: {}", flaw.advice());
        }
        if show_swap {
            if let Some(flaw) = target.swap_flaw {
                warn!("swap accounting: {}", flaw.advice());
            }
        }
    }
}

impl ReportSink for ConsoleReport {
    fn cycle(&mut self, totals: &[(GroupKey, CommandTotal)], target: &Target) {
        let ram_total: u64 = totals.iter().map(|(_, t)| t.ram_kb()).sum();
        let swap_total: u64 = totals.iter().map(|(_, t)| t.swap_kb).sum();

        if self.total_only {
            if self.show_swap {
                println!("{} {}", human_size(ram_total), human_size(swap_total));
            } else {
                println!("{}", human_size(ram_total));
            }
            return;
        }

        if self.show_swap {
            println!(" Private  +   Shared  =  RAM used   Swap used\tProgram");
        } else {
            println!(" Private  +   Shared  =  RAM used\tProgram");
        }
        println!();

        for (key, total) in totals {
            let mut row = format!(
                "{:>9} + {:>9} = {:>9}",
                human_size(total.private_kb),
                human_size(total.shared_kb),
                human_size(total.ram_kb()),
            );
            if self.show_swap {
                row.push_str(&format!("  {:>10}", human_size(total.swap_kb)));
            }
            row.push('\t');
            row.push_str(&key.to_string());
            if total.count > 1 {
                row.push_str(&format!(" ({})", total.count));
            }
            println!("{row}");
        }

        let width = if self.show_swap { 45 } else { 33 };
        println!("{}", "-".repeat(width));
        // A grand total is only honest on flaw-free accounting.
        if target.ram_flaw.is_none() {
            if self.show_swap && target.swap_flaw.is_none() {
                println!("{:>33}  {:>10}", human_size(ram_total), human_size(swap_total));
            } else {
                println!("{:>33}", human_size(ram_total));
            }
        }
        println!("{}", "=".repeat(width));
    }

    fn lost(&mut self, lost: &[LostProcess]) {
        let pids: Vec<String> = lost.iter().map(|l| l.pid().to_string()).collect();
        warn!(
            "skipped {} process(es) this cycle: pids {}",
            lost.len(),
            pids.join(", ")
        );
        for failure in lost {
            warn!("  {}", failure);
        }
    }

    fn terminated(&mut self) {
        info!("no target process remains; stopping");
    }
}

/// Render a kilobyte count in human units, one decimal.
pub fn human_size(kb: u64) -> String {
    const UNITS: [&str; 5] = ["KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut size = kb as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size_units() {
        assert_eq!(human_size(0), "0.0 KiB");
        assert_eq!(human_size(320), "320.0 KiB");
        assert_eq!(human_size(1536), "1.5 MiB");
        assert_eq!(human_size(2 * 1024 * 1024), "2.0 GiB");
        assert_eq!(human_size(3 * 1024 * 1024 * 1024), "3.0 TiB");
    }

    #[test]
    fn test_human_size_rounding() {
        assert_eq!(human_size(1127), "1.1 MiB");
    }
}
