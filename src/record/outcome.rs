// src/record/outcome.rs

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::MetricsSummary;
use crate::task::{TaskId, TaskSpec};
use crate::types::TaskStatus;

/// Skip reason recorded for every task under `--dry-run`.
pub const DRY_RUN_REASON: &str = "dry run";

/// The single, immutable record of what happened to one task in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutcome {
    pub id: TaskId,
    pub name: String,
    pub phase: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    /// Exit code of the final command run; `None` if no process exited
    /// normally (skipped, timeout, spawn failure, signal).
    pub exit_code: Option<i32>,
    /// Classified failure description (`timeout after ...`,
    /// `command not found: ...`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,
    pub auto_fixed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recheck_duration_ms: Option<u64>,
    /// Exit code of the first run, before any auto-fix.
    pub initial_exit_code: Option<i32>,
    /// Helper-fix command surfaced to the user, never executed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsSummary>,
}

impl TaskOutcome {
    /// Outcome for a task that was not executed.
    pub fn skipped(spec: &TaskSpec, reason: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Skipped,
            skip_reason: Some(reason.into()),
            ..Self::blank(spec)
        }
    }

    /// Template with identity fields filled in and everything else empty.
    pub(crate) fn blank(spec: &TaskSpec) -> Self {
        Self {
            id: spec.id.clone(),
            name: spec.name.clone(),
            phase: spec.phase.clone(),
            kind: spec.kind.clone(),
            status: TaskStatus::Pass,
            skip_reason: None,
            exit_code: None,
            message: None,
            started_at: None,
            ended_at: None,
            duration_ms: 0,
            auto_fixed: false,
            fix_duration_ms: None,
            recheck_duration_ms: None,
            initial_exit_code: None,
            fix_suggestion: None,
            log_path: None,
            metrics: None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == TaskStatus::Fail
    }
}
