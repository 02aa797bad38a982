// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::task::OutputSpec;
use crate::types::{FixType, GitMode};

/// Phase name used for tasks that do not declare one.
pub const DEFAULT_PHASE: &str = "default";

/// Default directory (relative to the repository root) for logs and records.
pub const DEFAULT_OUTPUT_ROOT: &str = ".phaserun";

/// Top-level configuration exactly as read from a TOML file.
///
/// ```toml
/// [config]
/// git_mode = "staged_unstaged"
/// phases = ["lint", "test"]
///
/// [default]
/// env = { CI = "1" }
/// timeout = 600
///
/// [[task]]
/// id = "fmt"
/// phase = "lint"
/// cmd = "cargo fmt --check"
/// watch = ["**/*.rs"]
/// fix_type = "auto"
/// fix_cmd = "cargo fmt"
/// ```
///
/// Tasks are an array of tables so that configuration order is preserved;
/// that order drives phase membership order and the default phase order.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub default: DefaultSection,

    #[serde(default)]
    pub task: Vec<TaskConfig>,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`),
/// so holding one means the invariants in `validate.rs` hold.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub default: DefaultSection,
    pub task: Vec<TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        default: DefaultSection,
        task: Vec<TaskConfig>,
    ) -> Self {
        Self {
            config,
            default,
            task,
        }
    }

    pub fn default_section(&self) -> &DefaultSection {
        &self.default
    }

    pub fn tasks(&self) -> &[TaskConfig] {
        &self.task
    }

    /// Effective phase order: the explicit `[config].phases` list if present,
    /// otherwise phases in order of first appearance among tasks.
    pub fn phase_order(&self) -> Vec<String> {
        if let Some(phases) = &self.config.phases {
            return phases.clone();
        }

        let mut order: Vec<String> = Vec::new();
        for task in &self.task {
            let phase = task.phase_name();
            if !order.iter().any(|p| p == phase) {
                order.push(phase.to_string());
            }
        }
        order
    }
}

/// `[config]` section: run-wide behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Where logs and run records are written, relative to the repo root.
    #[serde(default = "default_output_root")]
    pub output_root: String,

    #[serde(default)]
    pub git_mode: GitMode,

    /// Comparison ref for `git_mode = "ref"`.
    #[serde(default)]
    pub git_ref: Option<String>,

    /// Explicit phase order. Every task phase must appear here when set.
    #[serde(default)]
    pub phases: Option<Vec<String>>,

    /// Tasks whose `estimate` exceeds this are deselected by `--fast`.
    #[serde(default = "default_fast_threshold_secs")]
    pub fast_threshold_secs: u64,

    /// Optional cap on concurrently running tasks within one phase.
    #[serde(default)]
    pub max_parallel: Option<usize>,
}

fn default_output_root() -> String {
    DEFAULT_OUTPUT_ROOT.to_string()
}

fn default_fast_threshold_secs() -> u64 {
    60
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            git_mode: GitMode::default(),
            git_ref: None,
            phases: None,
            fast_threshold_secs: default_fast_threshold_secs(),
            max_parallel: None,
        }
    }
}

/// `[default]` section, inherited by every task.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DefaultSection {
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub fix_type: Option<FixType>,

    /// Default timeout in seconds; 0 or absent means unbounded.
    #[serde(default)]
    pub timeout: Option<u64>,

    #[serde(default)]
    pub workdir: Option<String>,
}

/// `[[task]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub id: String,

    /// Display name; defaults to `id`.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub phase: Option<String>,

    /// Free-form type tag (`lint`, `test`, ...).
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    /// Shell command. May be empty only for `wait = true` markers.
    #[serde(default)]
    pub cmd: String,

    #[serde(default)]
    pub workdir: Option<String>,

    #[serde(default)]
    pub timeout: Option<u64>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Glob patterns relative to `workdir`; empty means "always run".
    #[serde(default)]
    pub watch: Vec<String>,

    #[serde(default)]
    pub fix_type: Option<FixType>,

    #[serde(default)]
    pub fix_cmd: Option<String>,

    #[serde(default)]
    pub output: Option<OutputSpec>,

    /// Rough duration estimate in seconds, consulted by `--fast`.
    #[serde(default)]
    pub estimate: Option<u64>,

    /// Barrier marker: tasks after it in the same phase wait for all tasks
    /// before it.
    #[serde(default)]
    pub wait: bool,
}

impl TaskConfig {
    pub fn phase_name(&self) -> &str {
        self.phase.as_deref().unwrap_or(DEFAULT_PHASE)
    }
}
