//! memsum - version 0.1.0
//!
//! Accurate, de-duplicated memory usage reporting with tracing logging.
//! This is the main entry point that wires configuration, the capability
//! probe and the polling controller together.

use std::time::Duration;

use clap::Parser;
use nix::unistd::geteuid;
use tracing::{error, warn, Level};

use memsum::cli::{Args, LogLevel};
use memsum::config::{resolve_config, show_config, validate_effective_config};
use memsum::error::FatalError;
use memsum::poll::{run_once, run_repeating, SampleOptions};
use memsum::procfs::ProcFs;
use memsum::process::name::NameStrategy;
use memsum::report::ConsoleReport;
use memsum::target::Target;

/// Initializes tracing logging subsystem with configured log level.
///
/// Diagnostics go to stderr; stdout carries only the report table.
fn setup_logging(args: &Args) {
    let log_level = match args.log_level {
        LogLevel::Off => Level::ERROR,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn main() {
    let args = Args::parse();

    // Early config resolution for show mode
    if args.show_config {
        let config = resolve_config(&args);
        if let Err(e) = show_config(&config, args.config_format) {
            eprintln!("Failed to render config: {e}");
            std::process::exit(1);
        }
        return;
    }

    setup_logging(&args);

    if let Err(e) = run(&args) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = resolve_config(args);
    validate_effective_config(&config).map_err(FatalError::Config)?;

    if !geteuid().is_root() {
        warn!("not running as root - only processes readable by this user are reported");
    }

    let procfs = ProcFs::new(&config.proc_root);

    let pids = match &config.pids {
        Some(list) => {
            // Explicit targets must be reachable up front; vanishing later
            // is handled per cycle.
            for &pid in list {
                if !procfs.pid_exists(pid) {
                    return Err(FatalError::PidUnreachable(pid).into());
                }
            }
            list.clone()
        }
        None => procfs.list_pids(),
    };

    let target = Target::probe(&procfs, pids)?;

    if config.total_only {
        if let Some(flaw) = target.ram_flaw {
            return Err(FatalError::InaccurateTotal(flaw.advice().into()).into());
        }
        if config.show_swap {
            if let Some(flaw) = target.swap_flaw {
                return Err(FatalError::InaccurateTotal(flaw.advice().into()).into());
            }
        }
    }

    ConsoleReport::advisories(&target, config.show_swap);

    let opts = SampleOptions {
        strategy: if config.split_args {
            NameStrategy::FullCmdline
        } else {
            NameStrategy::Basename
        },
        by_pid: config.discriminate_by_pid,
    };
    let mut sink = ConsoleReport::new(config.show_swap, config.total_only);

    match config.watch_seconds {
        Some(secs) => run_repeating(
            &procfs,
            &target,
            &opts,
            Duration::from_secs(secs),
            &mut sink,
        ),
        None => {
            let outcome = run_once(&procfs, &target, &opts, &mut sink);
            if outcome.resolved == 0 {
                return Err(FatalError::NoProcesses.into());
            }
        }
    }

    Ok(())
}
