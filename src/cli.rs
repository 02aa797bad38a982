// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::engine::RunFlags;
use crate::types::{FixType, GitMode};

/// Command-line arguments for `phaserun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "phaserun",
    version,
    about = "Run a repository's checks in phases, only where files changed.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Phaserun.toml` in the repository root.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Repository root. Defaults to the directory holding the config file.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Consider only these task ids (comma-separated, repeatable).
    #[arg(long, value_name = "IDS", value_delimiter = ',')]
    pub only: Vec<String>,

    /// Never consider these task ids (comma-separated, repeatable).
    #[arg(long, value_name = "IDS", value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Leave out tasks whose estimate exceeds `fast_threshold_secs`.
    #[arg(long)]
    pub fast: bool,

    /// Diff against this ref instead of the configured git mode.
    #[arg(long, value_name = "REF")]
    pub since: Option<String>,

    /// Run every task regardless of its watch paths.
    #[arg(long)]
    pub ignore_watch_paths: bool,

    /// Do not start later phases once a task has failed.
    #[arg(long)]
    pub fail_fast: bool,

    /// Report what would run without spawning any process.
    #[arg(long)]
    pub dry_run: bool,

    /// Override every task's fix type (auto, helper, none).
    #[arg(long, value_name = "TYPE")]
    pub fix_type: Option<FixType>,

    /// Override `[config].git_mode` (none, staged, staged_unstaged, ref).
    #[arg(long, value_name = "MODE")]
    pub git_mode: Option<GitMode>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PHASERUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

impl CliArgs {
    pub fn run_flags(&self) -> RunFlags {
        RunFlags {
            only: trimmed(&self.only),
            skip: trimmed(&self.skip),
            fast: self.fast,
            since: self.since.clone(),
            ignore_watch_paths: self.ignore_watch_paths,
            fail_fast: self.fail_fast,
            dry_run: self.dry_run,
            fix_type: self.fix_type,
            git_mode: self.git_mode,
        }
    }
}

fn trimmed(ids: &[String]) -> Vec<String> {
    ids.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
