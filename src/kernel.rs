//! Kernel version parsing and accounting-accuracy classification.
//!
//! What a kernel exposes under `/proc` decides how trustworthy the numbers
//! are. The classification is an ordered decision table evaluated top to
//! bottom, first match wins; every flaw is reported to the user rather
//! than hidden.

use std::fmt;

/// Running kernel version as a `(major, minor, patch)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct KernelVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl KernelVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        KernelVersion {
            major,
            minor,
            patch,
        }
    }

    /// Parse a release string like `6.1.0-13-amd64`.
    ///
    /// The first three dot-separated components are taken; `-` and `_`
    /// suffixes are stripped; anything non-numeric reads as 0; a missing
    /// patch component reads as 0. Never fails: an unrecognizable string
    /// classifies through the wildcard row of the decision table.
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.trim().split('.');
        let mut component = || {
            parts
                .next()
                .map(|p| {
                    p.split(['-', '_'])
                        .next()
                        .and_then(|n| n.parse::<u32>().ok())
                        .unwrap_or(0)
                })
                .unwrap_or(0)
        };
        let major = component();
        let minor = component();
        let patch = component();
        KernelVersion::new(major, minor, patch)
    }
}

impl fmt::Display for KernelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Known RAM-accounting accuracy limitation; `None` means fully accurate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamFlaw {
    /// Shared memory is always reported as zero; values are too large.
    NoSharedReported,
    /// Part of shared memory goes unreported; values may be too large.
    SomeSharedMissing,
    /// Shared memory is over-counted when several processes map the same
    /// region; accurate only per isolated process.
    IsolatedOnly,
}

impl RamFlaw {
    /// Operator-facing advisory text.
    pub fn advice(self) -> &'static str {
        match self {
            RamFlaw::NoSharedReported => {
                "shared memory is not reported by this system; values will be too large and totals are unreliable"
            }
            RamFlaw::SomeSharedMissing => {
                "shared memory is not reported accurately by this system; totals are unreliable"
            }
            RamFlaw::IsolatedOnly => {
                "shared memory is slightly over-estimated for each program; totals are unreliable"
            }
        }
    }
}

/// Known swap-accounting accuracy limitation; `None` means fully accurate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapFlaw {
    /// No swap figure is available at all.
    NotReported,
    /// Swap is over-counted under aggregation; accurate only per isolated
    /// process.
    IsolatedOnly,
}

impl SwapFlaw {
    pub fn advice(self) -> &'static str {
        match self {
            SwapFlaw::NotReported => "swap is not reported by this system",
            SwapFlaw::IsolatedOnly => {
                "swap is over-estimated for each program; swap totals are unreliable"
            }
        }
    }
}

/// Accounting fields the probed kernel actually exposes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities {
    /// A detailed source (`smaps` or `smaps_rollup`) is readable.
    pub has_smaps: bool,
    /// The detailed source carries `Pss` proportional shares.
    pub has_pss: bool,
    /// The detailed source carries `SwapPss` proportional swap.
    pub has_swap_pss: bool,
}

/// Derive the accuracy flaws for a kernel/capability combination.
///
/// `legacy_inactive` is the 2.4.x meminfo probe: whether the global memory
/// info carries an `Inact_`-prefixed field. Evaluated top to bottom, first
/// match wins.
pub fn classify_flaws(
    kernel: KernelVersion,
    caps: &Capabilities,
    legacy_inactive: bool,
) -> (Option<RamFlaw>, Option<SwapFlaw>) {
    if kernel.major == 2 && kernel.minor == 4 {
        if legacy_inactive {
            (Some(RamFlaw::IsolatedOnly), Some(SwapFlaw::NotReported))
        } else {
            (Some(RamFlaw::SomeSharedMissing), Some(SwapFlaw::NotReported))
        }
    } else if kernel.major == 2 && kernel.minor == 6 && !caps.has_smaps {
        // Inside the 2.6.1 - 2.6.9 window the compact source under-reports
        // shared memory; outside it no usable shared figure exists at all.
        let ram = if kernel >= KernelVersion::new(2, 6, 1) && kernel <= KernelVersion::new(2, 6, 9)
        {
            RamFlaw::SomeSharedMissing
        } else {
            RamFlaw::NoSharedReported
        };
        (Some(ram), Some(SwapFlaw::NotReported))
    } else if kernel.major == 2 && kernel.minor == 6 && caps.has_smaps {
        if caps.has_pss {
            (None, Some(SwapFlaw::IsolatedOnly))
        } else {
            (Some(RamFlaw::IsolatedOnly), Some(SwapFlaw::IsolatedOnly))
        }
    } else if kernel.major > 2 && caps.has_smaps {
        if caps.has_swap_pss {
            (None, None)
        } else {
            (None, Some(SwapFlaw::IsolatedOnly))
        }
    } else {
        (Some(RamFlaw::IsolatedOnly), Some(SwapFlaw::NotReported))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Tests for KernelVersion::parse
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_distro_release() {
        assert_eq!(
            KernelVersion::parse("6.1.0-13-amd64"),
            KernelVersion::new(6, 1, 0)
        );
    }

    #[test]
    fn test_parse_two_component_release() {
        assert_eq!(KernelVersion::parse("2.6"), KernelVersion::new(2, 6, 0));
    }

    #[test]
    fn test_parse_underscore_suffix() {
        assert_eq!(
            KernelVersion::parse("5.15.2_custom"),
            KernelVersion::new(5, 15, 2)
        );
    }

    #[test]
    fn test_parse_garbage_reads_as_zero() {
        assert_eq!(KernelVersion::parse("mystery"), KernelVersion::new(0, 0, 0));
    }

    // -------------------------------------------------------------------------
    // Tests for classify_flaws (every row of the decision table)
    // -------------------------------------------------------------------------

    fn caps(has_smaps: bool, has_pss: bool, has_swap_pss: bool) -> Capabilities {
        Capabilities {
            has_smaps,
            has_pss,
            has_swap_pss,
        }
    }

    #[test]
    fn test_24_with_inactive_field() {
        let (ram, swap) = classify_flaws(
            KernelVersion::new(2, 4, 20),
            &caps(false, false, false),
            true,
        );
        assert_eq!(ram, Some(RamFlaw::IsolatedOnly));
        assert_eq!(swap, Some(SwapFlaw::NotReported));
    }

    #[test]
    fn test_24_without_inactive_field() {
        let (ram, swap) = classify_flaws(
            KernelVersion::new(2, 4, 20),
            &caps(false, false, false),
            false,
        );
        assert_eq!(ram, Some(RamFlaw::SomeSharedMissing));
        assert_eq!(swap, Some(SwapFlaw::NotReported));
    }

    #[test]
    fn test_26_window_no_smaps_misses_some_shared() {
        let (ram, swap) =
            classify_flaws(KernelVersion::new(2, 6, 5), &caps(false, false, false), false);
        assert_eq!(ram, Some(RamFlaw::SomeSharedMissing));
        assert_eq!(swap, Some(SwapFlaw::NotReported));
    }

    #[test]
    fn test_26_outside_window_no_smaps_reports_no_shared() {
        let (ram, swap) = classify_flaws(
            KernelVersion::new(2, 6, 27),
            &caps(false, false, false),
            false,
        );
        assert_eq!(ram, Some(RamFlaw::NoSharedReported));
        assert_eq!(swap, Some(SwapFlaw::NotReported));
    }

    #[test]
    fn test_26_smaps_with_pss() {
        let (ram, swap) =
            classify_flaws(KernelVersion::new(2, 6, 32), &caps(true, true, false), false);
        assert_eq!(ram, None);
        assert_eq!(swap, Some(SwapFlaw::IsolatedOnly));
    }

    #[test]
    fn test_26_smaps_without_pss() {
        let (ram, swap) =
            classify_flaws(KernelVersion::new(2, 6, 12), &caps(true, false, false), false);
        assert_eq!(ram, Some(RamFlaw::IsolatedOnly));
        assert_eq!(swap, Some(SwapFlaw::IsolatedOnly));
    }

    #[test]
    fn test_modern_with_swap_pss_is_accurate() {
        let (ram, swap) =
            classify_flaws(KernelVersion::new(6, 1, 0), &caps(true, true, true), false);
        assert_eq!(ram, None);
        assert_eq!(swap, None);
    }

    #[test]
    fn test_modern_without_swap_pss() {
        let (ram, swap) =
            classify_flaws(KernelVersion::new(4, 4, 0), &caps(true, true, false), false);
        assert_eq!(ram, None);
        assert_eq!(swap, Some(SwapFlaw::IsolatedOnly));
    }

    #[test]
    fn test_wildcard_row() {
        let (ram, swap) =
            classify_flaws(KernelVersion::new(5, 10, 0), &caps(false, false, false), false);
        assert_eq!(ram, Some(RamFlaw::IsolatedOnly));
        assert_eq!(swap, Some(SwapFlaw::NotReported));
    }
}
