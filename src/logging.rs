// src/logging.rs

//! `tracing` subscriber for the `phaserun` binary.
//!
//! The filter comes from the first of:
//! 1. `--log-level` (applies to every target)
//! 2. `PHASERUN_LOG`, read as an `EnvFilter` directive such as
//!    `phaserun::schedule=debug,warn`
//! 3. `info`
//!
//! Logs go to stderr. Stdout carries only the run summary, and task output
//! lands in the per-task log files.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

const LOG_ENV_VAR: &str = "PHASERUN_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_directive = std::env::var(LOG_ENV_VAR).ok();
    let directive = filter_directive(cli_level, env_directive.as_deref());

    let filter = EnvFilter::try_new(&directive).or_else(|e| {
        eprintln!("phaserun: ignoring invalid {LOG_ENV_VAR}={directive:?}: {e}");
        EnvFilter::try_new(DEFAULT_DIRECTIVE)
    })?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

/// Filter directive for the given CLI level and `PHASERUN_LOG` value.
pub fn filter_directive(cli_level: Option<LogLevel>, env_directive: Option<&str>) -> String {
    if let Some(level) = cli_level {
        return level.as_str().to_string();
    }
    env_directive
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_DIRECTIVE)
        .to_string()
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
