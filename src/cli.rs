//! CLI arguments for memsum.
//!
//! This module defines the command-line interface structure using the clap
//! library.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::procfs::Pid;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Output format options for --show-config
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "memsum",
    about = "Accurate, de-duplicated memory usage per program",
    long_about = "Accurate, de-duplicated memory usage per program.\n\n\
                  Reads per-process memory accounting from /proc and reports private,\n\
                  shared and swap usage grouped by program, using proportional-share\n\
                  (Pss) accounting where the kernel provides it instead of naive RSS\n\
                  summation, which double-counts memory shared between processes.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version = "0.1.0"
)]
pub struct Args {
    /// Only report the given PIDs (comma-separated; default: all accessible processes)
    #[arg(short = 'p', long = "pids", value_delimiter = ',')]
    pub pids: Option<Vec<Pid>>,

    /// Also show swap usage
    #[arg(short = 'S', long = "show-swap")]
    pub show_swap: bool,

    /// Print only the grand total
    #[arg(short = 't', long)]
    pub total: bool,

    /// Show each process separately instead of grouping by program
    #[arg(short = 'd', long)]
    pub discriminate_by_pid: bool,

    /// Group by full command line instead of program name
    #[arg(short = 's', long)]
    pub split_args: bool,

    /// Re-sample and print every N seconds until all targets exit
    #[arg(short = 'w', long, value_name = "SECONDS")]
    pub watch: Option<u64>,

    /// Alternate procfs root (containers, testing)
    #[arg(long, default_value = "/proc")]
    pub proc_root: PathBuf,

    /// Log level
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Print effective config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pid_list() {
        let args = Args::parse_from(["memsum", "-p", "1,2,3"]);
        assert_eq!(args.pids, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["memsum"]);
        assert_eq!(args.pids, None);
        assert!(!args.show_swap);
        assert!(!args.total);
        assert_eq!(args.watch, None);
        assert_eq!(args.proc_root, PathBuf::from("/proc"));
    }

    #[test]
    fn test_short_flags() {
        let args = Args::parse_from(["memsum", "-S", "-t", "-d", "-s", "-w", "5"]);
        assert!(args.show_swap);
        assert!(args.total);
        assert!(args.discriminate_by_pid);
        assert!(args.split_args);
        assert_eq!(args.watch, Some(5));
    }
}
