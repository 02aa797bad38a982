// src/changes/mod.rs

//! Change detection and per-task run/skip selection.
//!
//! This module is responsible for:
//! - Resolving the effective git mode/ref (`--since` wins over config).
//! - Listing changed files through a [`ChangeSource`] (git in production).
//! - Compiling each task's watch globs relative to its working directory and
//!   matching them against the change set.
//! - Narrowing the task list by `--only`, `--skip` and `--fast`.
//!
//! It knows nothing about phases or processes; it only turns configuration
//! plus repository state into include/skip decisions.

pub mod filters;
pub mod git;
pub mod path_utils;
pub mod patterns;
pub mod selector;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::types::GitMode;

pub use filters::{apply_selection_flags, SelectionFlags};
pub use git::{ChangeSource, GitChangeSource};
pub use patterns::{build_task_watch_profile, TaskWatchProfile};
pub use selector::{select_tasks, Decision, SkipReason, TaskSelection};

/// Files considered changed for this run, plus the mode/ref that produced
/// them. Computed once and shared read-only by every task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub mode: GitMode,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    /// Repository-relative paths with forward slashes, sorted and unique.
    pub files: Vec<String>,
}

impl ChangeSet {
    pub fn new(mode: GitMode, reference: Option<String>, mut files: Vec<String>) -> Self {
        files.sort();
        files.dedup();
        Self {
            mode,
            reference,
            files,
        }
    }

    pub fn empty(mode: GitMode, reference: Option<String>) -> Self {
        Self::new(mode, reference, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// With `git_mode = "none"` the change set carries no information and
    /// watch paths are not consulted.
    pub fn filters_tasks(&self) -> bool {
        self.mode != GitMode::None
    }
}

/// Resolve the change set for this run.
///
/// `since` overrides the configured mode to `ref` mode with that ref. Any
/// error from the source (bad ref, no commits, not a repository) degrades to
/// an empty change set and is logged, never propagated.
pub fn resolve_change_set(
    source: &dyn ChangeSource,
    configured_mode: GitMode,
    configured_ref: Option<&str>,
    since: Option<&str>,
) -> ChangeSet {
    let (mode, reference) = match since {
        Some(since) => (GitMode::Ref, Some(since.to_string())),
        None => (configured_mode, configured_ref.map(str::to_string)),
    };

    if mode == GitMode::None {
        debug!("git mode is none; change set is empty and watch paths are ignored");
        return ChangeSet::empty(mode, reference);
    }

    match source.changed_files(mode, reference.as_deref()) {
        Ok(files) => {
            let set = ChangeSet::new(mode, reference, files);
            info!(mode = %set.mode, changed = set.len(), "resolved change set");
            set
        }
        Err(err) => {
            warn!(
                mode = %mode,
                reference = reference.as_deref().unwrap_or(""),
                error = %format!("{err:#}"),
                "could not resolve changed files; treating change set as empty"
            );
            ChangeSet::empty(mode, reference)
        }
    }
}
