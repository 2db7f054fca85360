//! Configuration for memsum.
//!
//! The effective configuration is resolved from CLI arguments and
//! validated before any sampling. `--show-config` renders it as YAML or
//! JSON for debugging.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cli::{Args, ConfigFormat};
use crate::procfs::Pid;

pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Effective run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Explicit pid list; `None` means all accessible processes.
    pub pids: Option<Vec<Pid>>,
    pub show_swap: bool,
    pub total_only: bool,
    pub discriminate_by_pid: bool,
    pub split_args: bool,
    /// Repeat period in seconds; `None` means single-shot.
    pub watch_seconds: Option<u64>,
    pub proc_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pids: None,
            show_swap: false,
            total_only: false,
            discriminate_by_pid: false,
            split_args: false,
            watch_seconds: None,
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
        }
    }
}

/// Resolve the effective configuration from CLI arguments.
pub fn resolve_config(args: &Args) -> Config {
    Config {
        pids: args.pids.clone(),
        show_swap: args.show_swap,
        total_only: args.total,
        discriminate_by_pid: args.discriminate_by_pid,
        split_args: args.split_args,
        watch_seconds: args.watch,
        proc_root: args.proc_root.clone(),
    }
}

/// Validate the effective configuration before sampling starts.
pub fn validate_effective_config(config: &Config) -> Result<(), String> {
    if let Some(0) = config.watch_seconds {
        return Err("watch period must be at least 1 second".into());
    }
    if let Some(pids) = &config.pids {
        if pids.is_empty() {
            return Err("empty pid list".into());
        }
        if pids.contains(&0) {
            return Err("pid 0 is not a valid target".into());
        }
    }
    Ok(())
}

/// Render the effective configuration to stdout.
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    let rendered = match format {
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
    };
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_resolve_from_args() {
        let args = Args::parse_from(["memsum", "-p", "10,20", "-S", "-w", "3"]);
        let config = resolve_config(&args);
        assert_eq!(config.pids, Some(vec![10, 20]));
        assert!(config.show_swap);
        assert_eq!(config.watch_seconds, Some(3));
        assert!(validate_effective_config(&config).is_ok());
    }

    #[test]
    fn test_zero_watch_rejected() {
        let config = Config {
            watch_seconds: Some(0),
            ..Config::default()
        };
        assert!(validate_effective_config(&config).is_err());
    }

    #[test]
    fn test_pid_zero_rejected() {
        let config = Config {
            pids: Some(vec![1, 0]),
            ..Config::default()
        };
        assert!(validate_effective_config(&config).is_err());
    }

    #[test]
    fn test_default_config_valid() {
        assert!(validate_effective_config(&Config::default()).is_ok());
    }
}
