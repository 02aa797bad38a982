// src/task.rs

//! Fully-resolved task description consumed by the engine.
//!
//! A [`TaskSpec`] carries no inheritance logic: defaults, env layering and
//! fix-type overrides have already been applied by
//! [`crate::config::resolve`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{FixType, OutputFormat};

/// Canonical task id type used throughout the engine.
pub type TaskId = String;

/// Declared output file of a task, fed to the metrics parsers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OutputSpec {
    pub format: OutputFormat,
    /// Path relative to the task's working directory (or absolute).
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub id: TaskId,
    pub name: String,
    pub phase: String,
    pub kind: String,
    pub command: String,
    /// Absolute, or relative to the repository root.
    pub workdir: PathBuf,
    /// Seconds; 0 disables the deadline.
    pub timeout_secs: u64,
    /// Task environment with `[default].env` already merged underneath.
    pub env: BTreeMap<String, String>,
    pub watch: Vec<String>,
    pub fix_type: FixType,
    pub fix_command: Option<String>,
    pub output: Option<OutputSpec>,
    pub estimate_secs: Option<u64>,
    pub wait: bool,
}

impl TaskSpec {
    /// Working directory as an absolute-or-root-joined path.
    pub fn resolved_workdir(&self, repo_root: &Path) -> PathBuf {
        if self.workdir.is_absolute() {
            self.workdir.clone()
        } else {
            repo_root.join(&self.workdir)
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// `wait` markers may have no command; everything else always has one.
    pub fn has_command(&self) -> bool {
        !self.command.trim().is_empty()
    }

    /// The configured fix command, ignoring blank strings.
    pub fn fix_command(&self) -> Option<&str> {
        self.fix_command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}
