// src/changes/filters.rs

//! `--only`, `--skip` and `--fast` narrowing of the task list.
//!
//! Tasks removed here are not "selected for consideration": they produce no
//! outcome at all, unlike change-selector skips which are recorded.

use std::collections::HashSet;

use tracing::info;

use crate::errors::{PhaserunError, Result};
use crate::task::TaskSpec;

#[derive(Debug, Clone, Default)]
pub struct SelectionFlags {
    /// When non-empty, keep only these ids.
    pub only: Vec<String>,
    /// Drop these ids.
    pub skip: Vec<String>,
    /// Drop tasks whose estimate exceeds `fast_threshold_secs`.
    pub fast: bool,
    pub fast_threshold_secs: u64,
}

/// Apply the selection flags, preserving configuration order.
///
/// Unknown ids in `only`/`skip` are configuration errors.
pub fn apply_selection_flags(specs: Vec<TaskSpec>, flags: &SelectionFlags) -> Result<Vec<TaskSpec>> {
    let known: HashSet<&str> = specs.iter().map(|s| s.id.as_str()).collect();
    for id in flags.only.iter().chain(flags.skip.iter()) {
        if !known.contains(id.as_str()) {
            return Err(PhaserunError::UnknownTask(id.clone()));
        }
    }

    let only: HashSet<&str> = flags.only.iter().map(String::as_str).collect();
    let skip: HashSet<&str> = flags.skip.iter().map(String::as_str).collect();

    let before = specs.len();
    let kept: Vec<TaskSpec> = specs
        .into_iter()
        .filter(|spec| only.is_empty() || only.contains(spec.id.as_str()))
        .filter(|spec| !skip.contains(spec.id.as_str()))
        .filter(|spec| !flags.fast || !exceeds_fast_threshold(spec, flags.fast_threshold_secs))
        .collect();

    if kept.len() != before {
        info!(
            selected = kept.len(),
            deselected = before - kept.len(),
            "applied --only/--skip/--fast selection"
        );
    }

    Ok(kept)
}

fn exceeds_fast_threshold(spec: &TaskSpec, threshold_secs: u64) -> bool {
    spec.estimate_secs.is_some_and(|estimate| estimate > threshold_secs)
}
