// src/engine/mod.rs

//! Orchestration engine for one phaserun invocation.
//!
//! This module ties together:
//! - task resolution and the `--only` / `--skip` / `--fast` narrowing
//! - the change set and per-task include/skip decisions
//! - the phase scheduler and the result recorder
//!
//! Planning is pure and synchronous and lives in [`plan`]; the async shell
//! that actually runs processes is [`runtime`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::model::ConfigFile;
use crate::types::{FixType, GitMode};

pub mod plan;
pub mod runtime;

pub use plan::{plan_run, RunPlan};
pub use runtime::execute_run;

/// Behavioural flags of a run, recorded verbatim in the run record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunFlags {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub only: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip: Vec<String>,
    #[serde(default)]
    pub fast: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(default)]
    pub ignore_watch_paths: bool,
    #[serde(default)]
    pub fail_fast: bool,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_type: Option<FixType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_mode: Option<GitMode>,
}

/// Immutable inputs of a run, shared by reference by every stage.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub repo_root: PathBuf,
    pub config: ConfigFile,
    pub flags: RunFlags,
}

impl RunConfig {
    pub fn new(repo_root: impl Into<PathBuf>, config: ConfigFile, flags: RunFlags) -> Self {
        Self {
            repo_root: repo_root.into(),
            config,
            flags,
        }
    }

    /// `[config].output_root`, anchored at the repository root when relative.
    pub fn output_root(&self) -> PathBuf {
        let root = Path::new(&self.config.config.output_root);
        if root.is_absolute() {
            root.to_path_buf()
        } else {
            self.repo_root.join(root)
        }
    }

    /// Where task logs of run `run_id` go.
    pub fn log_dir(&self, run_id: &str) -> PathBuf {
        self.output_root().join(run_id).join("logs")
    }

    /// CLI `--git-mode` wins over the configured mode.
    pub fn git_mode(&self) -> GitMode {
        self.flags.git_mode.unwrap_or(self.config.config.git_mode)
    }
}
