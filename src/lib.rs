// src/lib.rs

pub mod changes;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod metrics;
pub mod record;
pub mod schedule;
pub mod task;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::changes::GitChangeSource;
use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, load_and_validate};
use crate::engine::{execute_run, RunConfig};
use crate::exec::ProcessBackend;
use crate::record::{render_summary, write_run_record};
use crate::types::RunStatus;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - the git change source
/// - the process backend and phase scheduler
/// - persisting the run record and printing the summary
pub async fn run(args: CliArgs) -> Result<RunStatus> {
    let (config_path, repo_root) = locate(&args)?;
    debug!(config = %config_path.display(), root = %repo_root.display(), "locations");

    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;

    let run_config = RunConfig::new(repo_root.clone(), cfg, args.run_flags());
    let source = GitChangeSource::new(repo_root);
    let record = execute_run(&run_config, &source, Arc::new(ProcessBackend::new())).await?;

    if run_config.flags.dry_run {
        info!("dry run: run record not written");
    } else {
        write_run_record(&record, &run_config.output_root())?;
    }

    print!("{}", render_summary(&record));
    Ok(record.result.status)
}

/// Resolve the config file and repository root from `--config` / `--root`.
///
/// - Both given: used as is.
/// - Only `--root`: the config is `Phaserun.toml` inside it.
/// - Only `--config`: the root is the config file's directory.
/// - Neither: `Phaserun.toml` in the current directory.
fn locate(args: &CliArgs) -> Result<(PathBuf, PathBuf)> {
    let cwd = std::env::current_dir().context("reading current directory")?;

    let root = args.root.as_ref().map(|r| absolutize(&cwd, r));
    let config = match (&args.config, &root) {
        (Some(c), _) => absolutize(&cwd, c),
        (None, Some(r)) => r.join(default_config_path()),
        (None, None) => cwd.join(default_config_path()),
    };
    let root = match root {
        Some(r) => r,
        None => config_root_dir(&config, &cwd),
    };
    Ok((config, root))
}

fn absolutize(cwd: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        cwd.join(p)
    }
}

fn config_root_dir(config_path: &Path, cwd: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => cwd.to_path_buf(),
    }
}
