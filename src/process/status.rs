//! Parsing of the line-oriented `/proc/<pid>/status` record.

use crate::error::ProcError;
use crate::procfs::Pid;

/// The two mandatory fields of a process status record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusInfo {
    /// Kernel task name (`Name:`); never empty.
    pub name: String,
    /// Parent process id (`PPid:`).
    pub parent: Pid,
}

/// Parse `Key:\tvalue` lines, extracting `Name` and `PPid`.
///
/// Field order is irrelevant; on duplicate keys the last occurrence wins.
/// All other fields are ignored. Fails when either mandatory field is
/// absent or malformed.
pub fn parse_status_info(text: &str) -> Result<StatusInfo, ProcError> {
    let mut name: Option<&str> = None;
    let mut ppid: Option<&str> = None;

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            "Name" => name = Some(value.trim()),
            "PPid" => ppid = Some(value.trim()),
            _ => {}
        }
    }

    let name = name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ProcError::Malformed {
            what: "status record",
            detail: "missing or empty Name field".into(),
        })?;

    let parent = ppid
        .ok_or_else(|| ProcError::Malformed {
            what: "status record",
            detail: "missing PPid field".into(),
        })?
        .parse::<Pid>()
        .map_err(|e| ProcError::Malformed {
            what: "status record",
            detail: format!("unparsable PPid field: {e}"),
        })?;

    Ok(StatusInfo {
        name: name.to_string(),
        parent,
    })
}
