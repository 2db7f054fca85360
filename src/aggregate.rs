//! Aggregation of per-process memory records into per-command totals.

use std::fmt;

use ahash::{AHashMap, AHashSet};

use crate::procfs::Pid;
use crate::process::memory::MemoryRecord;

/// Grouping key: command name, optionally discriminated by pid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub name: String,
    pub pid: Option<Pid>,
}

impl GroupKey {
    pub fn by_name(name: String) -> Self {
        GroupKey { name, pid: None }
    }

    pub fn by_pid(name: String, pid: Pid) -> Self {
        GroupKey {
            name,
            pid: Some(pid),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pid {
            Some(pid) => write!(f, "{} [{}]", self.name, pid),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Aggregate across all processes grouped under one key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandTotal {
    pub private_kb: u64,
    pub shared_kb: u64,
    pub swap_kb: u64,
    /// Number of processes folded into this total.
    pub count: u32,
}

impl CommandTotal {
    pub fn ram_kb(&self) -> u64 {
        self.private_kb + self.shared_kb
    }
}

/// Group `(key, record)` pairs into totals, in insertion order of first
/// occurrence.
///
/// `private` and `swap` always sum: proportional semantics (when present)
/// already avoid double counting. Shared memory depends on `has_pss`:
/// proportional shares sum too, while raw shared figures are de-duplicated
/// by accounting-text fingerprint, so several processes exposing
/// byte-identical shared-mapping accounting contribute once. Hugetlb
/// shared pages sit outside the proportional fields and are fingerprinted
/// either way.
pub fn aggregate(samples: &[(GroupKey, MemoryRecord)], has_pss: bool) -> Vec<(GroupKey, CommandTotal)> {
    let mut groups: Vec<(GroupKey, CommandTotal, AHashSet<u64>)> = Vec::new();
    let mut index: AHashMap<GroupKey, usize> = AHashMap::new();

    for (key, rec) in samples {
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key.clone(), CommandTotal::default(), AHashSet::new()));
            groups.len() - 1
        });
        let (_, total, seen) = &mut groups[slot];

        total.private_kb += rec.private_kb;
        total.swap_kb += rec.swap_kb;
        total.count += 1;

        let first_with_this_text = seen.insert(rec.fingerprint);
        if has_pss {
            total.shared_kb += rec.shared_kb;
            if first_with_this_text {
                total.shared_kb += rec.shared_huge_kb;
            }
        } else if first_with_this_text {
            total.shared_kb += rec.shared_kb + rec.shared_huge_kb;
        }
    }

    groups.into_iter().map(|(key, total, _)| (key, total)).collect()
}
