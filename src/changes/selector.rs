// src/changes/selector.rs

//! Per-task include/skip decisions against a resolved [`ChangeSet`].

use std::fmt;
use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::changes::ChangeSet;
use crate::changes::patterns::build_task_watch_profile;
use crate::task::TaskSpec;

/// Why a task was filtered out by the change selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The change set is empty.
    NoChangedFiles,
    /// Files changed, but none matched the task's watch paths.
    NoMatchingChanges,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::NoChangedFiles => "no changed files",
            SkipReason::NoMatchingChanges => "no matching changes",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Include,
    Skip(SkipReason),
}

impl Decision {
    pub fn is_included(self) -> bool {
        matches!(self, Decision::Include)
    }

    pub fn skip_reason(self) -> Option<SkipReason> {
        match self {
            Decision::Include => None,
            Decision::Skip(reason) => Some(reason),
        }
    }
}

/// A task together with the selector's verdict for it.
#[derive(Debug, Clone)]
pub struct TaskSelection {
    pub spec: TaskSpec,
    pub decision: Decision,
}

/// Decide, for every task, whether it runs.
///
/// A task is included when:
/// - `ignore_watch_paths` is set, or
/// - the change set does not filter (git mode `none`), or
/// - it has no watch patterns, or
/// - one of its patterns (anchored at its workdir) matches a changed file.
///
/// Each task is judged on its own; the output has one entry per input task
/// in input order.
pub fn select_tasks(
    specs: Vec<TaskSpec>,
    changes: &ChangeSet,
    repo_root: &Path,
    ignore_watch_paths: bool,
) -> Result<Vec<TaskSelection>> {
    let mut selections = Vec::with_capacity(specs.len());

    for spec in specs {
        let decision = decide(&spec, changes, repo_root, ignore_watch_paths)?;
        debug!(task = %spec.id, ?decision, "change selection");
        selections.push(TaskSelection { spec, decision });
    }

    Ok(selections)
}

fn decide(
    spec: &TaskSpec,
    changes: &ChangeSet,
    repo_root: &Path,
    ignore_watch_paths: bool,
) -> Result<Decision> {
    if ignore_watch_paths || !changes.filters_tasks() || spec.watch.is_empty() {
        return Ok(Decision::Include);
    }

    if changes.is_empty() {
        return Ok(Decision::Skip(SkipReason::NoChangedFiles));
    }

    let profile = build_task_watch_profile(spec, repo_root)?;
    if profile.matches_any(&changes.files) {
        Ok(Decision::Include)
    } else {
        Ok(Decision::Skip(SkipReason::NoMatchingChanges))
    }
}
