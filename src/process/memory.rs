//! Memory accounting parsers for memsum.
//!
//! Two numerically equivalent but materially different sources exist per
//! process: the compact page-count format of `statm` and the detailed
//! `Field: value kB` format of `smaps` / `smaps_rollup`. Both normalize
//! into a [`MemoryRecord`]; all accumulation is exact integer arithmetic
//! in kilobytes.

use std::hash::BuildHasher;

use once_cell::sync::Lazy;

use crate::error::ProcError;

/// System page size in kilobytes (usually 4).
pub static PAGE_SIZE_KB: Lazy<u64> = Lazy::new(page_size_kb);

fn page_size_kb() -> u64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_PAGESIZE
        // Returns -1 on error - handled by the > 0 check
        unsafe {
            let sz = libc::sysconf(libc::_SC_PAGESIZE);
            if sz > 0 {
                return sz as u64 / 1024;
            }
        }
    }
    4
}

/// Fixed-seed hasher state for accounting-text fingerprints.
///
/// The seeds are arbitrary but fixed: two processes exposing byte-identical
/// accounting text must hash to the same value, within a run and across
/// runs.
static FINGERPRINT_STATE: Lazy<ahash::RandomState> = Lazy::new(|| {
    ahash::RandomState::with_seeds(
        0x6d65_6d73_756d_0001,
        0x6d65_6d73_756d_0002,
        0x6d65_6d73_756d_0003,
        0x6d65_6d73_756d_0004,
    )
});

/// Content hash of raw accounting text.
pub fn fingerprint(text: &str) -> u64 {
    FINGERPRINT_STATE.hash_one(text.as_bytes())
}

/// Normalized per-process memory accounting, all sizes in kilobytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRecord {
    pub private_kb: u64,
    pub shared_kb: u64,
    pub shared_huge_kb: u64,
    pub swap_kb: u64,
    /// Hash of the raw accounting text this record was parsed from; equal
    /// fingerprints identify byte-identical shared-mapping accounting.
    pub fingerprint: u64,
}

/// Parse the compact format: space-separated page counts in the fixed
/// order `[size, resident, shared, text, lib, data, dirty]`.
///
/// `shared_tracked` reflects the kernel capability probe: on kernels where
/// the shared column is universally unreliable it is ignored and the whole
/// resident set counts as private.
pub fn parse_statm(
    text: &str,
    page_kb: u64,
    shared_tracked: bool,
) -> Result<MemoryRecord, ProcError> {
    let fields = text
        .split_whitespace()
        .map(|f| {
            f.parse::<u64>().map_err(|e| ProcError::Malformed {
                what: "statm",
                detail: format!("non-numeric field {f:?}: {e}"),
            })
        })
        .collect::<Result<Vec<u64>, ProcError>>()?;

    if fields.len() < 7 {
        return Err(ProcError::Malformed {
            what: "statm",
            detail: format!("expected 7 fields, got {}", fields.len()),
        });
    }

    let resident_kb = fields[1] * page_kb;
    let shared_kb = if shared_tracked { fields[2] * page_kb } else { 0 };

    Ok(MemoryRecord {
        private_kb: resident_kb.saturating_sub(shared_kb),
        shared_kb,
        shared_huge_kb: 0,
        swap_kb: 0,
        fingerprint: fingerprint(text),
    })
}

/// Parse the detailed format: line-oriented `Field: value kB` records,
/// either per-mapping (`smaps`) or pre-aggregated (`smaps_rollup`).
///
/// When a `Pss` field is present the shared figure is recomputed as the
/// proportional share `Σ Pss − (private − private_hugetlb)`; when `SwapPss`
/// is present it is preferred over raw `Swap`. Unknown fields are ignored.
pub fn parse_smaps(text: &str) -> Result<MemoryRecord, ProcError> {
    let mut private_clean = 0u64;
    let mut private_dirty = 0u64;
    let mut private_huge = 0u64;
    let mut shared_clean = 0u64;
    let mut shared_dirty = 0u64;
    let mut shared_huge = 0u64;
    let mut swap = 0u64;
    let mut swap_pss = 0u64;
    let mut pss = 0u64;
    let mut saw_pss = false;
    let mut saw_swap_pss = false;

    for line in text.lines() {
        if let Some(v) = line.strip_prefix("Private_Clean:") {
            private_clean += field_kb(v)?;
        } else if let Some(v) = line.strip_prefix("Private_Dirty:") {
            private_dirty += field_kb(v)?;
        } else if let Some(v) = line.strip_prefix("Private_Hugetlb:") {
            private_huge += field_kb(v)?;
        } else if let Some(v) = line.strip_prefix("Shared_Clean:") {
            shared_clean += field_kb(v)?;
        } else if let Some(v) = line.strip_prefix("Shared_Dirty:") {
            shared_dirty += field_kb(v)?;
        } else if let Some(v) = line.strip_prefix("Shared_Hugetlb:") {
            shared_huge += field_kb(v)?;
        } else if let Some(v) = line.strip_prefix("Swap:") {
            swap += field_kb(v)?;
        } else if let Some(v) = line.strip_prefix("SwapPss:") {
            swap_pss += field_kb(v)?;
            saw_swap_pss = true;
        } else if let Some(v) = line.strip_prefix("Pss:") {
            pss += field_kb(v)?;
            saw_pss = true;
        }
    }

    let private = private_clean + private_dirty + private_huge;
    let shared = if saw_pss {
        // Proportional estimate of this process's share of shared memory.
        // Hugetlb pages are outside Pss, so only the non-huge private part
        // is subtracted.
        pss.saturating_sub(private_clean + private_dirty)
    } else {
        shared_clean + shared_dirty
    };

    Ok(MemoryRecord {
        private_kb: private,
        shared_kb: shared,
        shared_huge_kb: shared_huge,
        swap_kb: if saw_swap_pss { swap_pss } else { swap },
        fingerprint: fingerprint(text),
    })
}

/// Parse the value part of a `Field: value kB` line.
fn field_kb(v: &str) -> Result<u64, ProcError> {
    v.split_whitespace()
        .next()
        .and_then(|n| n.parse::<u64>().ok())
        .ok_or_else(|| ProcError::Malformed {
            what: "smaps field",
            detail: format!("unparsable kB value {:?}", v.trim()),
        })
}
