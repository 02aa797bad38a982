// src/engine/plan.rs

//! Pure planning step: from configuration and repository state to the
//! phases that will run and the outcomes of tasks that will not.
//!
//! Nothing here spawns processes or touches tokio, so the whole selection
//! pipeline can be unit tested with a static change source.

use tracing::{debug, info};

use crate::changes::{
    apply_selection_flags, resolve_change_set, select_tasks, ChangeSet, ChangeSource,
    SelectionFlags,
};
use crate::config::resolve::resolve_tasks;
use crate::errors::{PhaserunError, Result};
use crate::record::TaskOutcome;
use crate::schedule::{group_by_phase, PhaseGroup};
use crate::types::GitMode;

use super::RunConfig;

#[derive(Debug, Clone)]
pub struct RunPlan {
    pub change_set: ChangeSet,
    /// Outcomes of tasks the change selector excluded, in config order.
    pub skipped: Vec<TaskOutcome>,
    /// Included tasks grouped by phase, in phase order.
    pub phases: Vec<PhaseGroup>,
}

impl RunPlan {
    pub fn included_count(&self) -> usize {
        self.phases.iter().map(PhaseGroup::len).sum()
    }
}

/// Resolve, narrow and select tasks for a run.
///
/// Fails only for configuration-class problems (unknown ids in `--only` /
/// `--skip`, ref mode without a ref, uncompilable watch globs). Git trouble
/// yields an empty change set instead.
pub fn plan_run(cfg: &RunConfig, source: &dyn ChangeSource) -> Result<RunPlan> {
    let flags = &cfg.flags;
    ensure_ref_for_ref_mode(cfg)?;

    let specs = resolve_tasks(&cfg.config, flags.fix_type);
    let specs = apply_selection_flags(
        specs,
        &SelectionFlags {
            only: flags.only.clone(),
            skip: flags.skip.clone(),
            fast: flags.fast,
            fast_threshold_secs: cfg.config.config.fast_threshold_secs,
        },
    )?;
    debug!(count = specs.len(), "tasks after selection flags");

    let change_set = resolve_change_set(
        source,
        cfg.git_mode(),
        cfg.config.config.git_ref.as_deref(),
        flags.since.as_deref(),
    );

    let selections = select_tasks(specs, &change_set, &cfg.repo_root, flags.ignore_watch_paths)?;

    let mut included = Vec::new();
    let mut skipped = Vec::new();
    for selection in selections {
        match selection.decision.skip_reason() {
            Some(reason) => skipped.push(TaskOutcome::skipped(&selection.spec, reason.as_str())),
            None => included.push(selection.spec),
        }
    }

    let phases = group_by_phase(included, &cfg.config.phase_order());
    let plan = RunPlan {
        change_set,
        skipped,
        phases,
    };

    info!(
        mode = %plan.change_set.mode,
        changed_files = plan.change_set.len(),
        included = plan.included_count(),
        skipped = plan.skipped.len(),
        "run planned"
    );
    Ok(plan)
}

/// `--git-mode ref` needs a ref from `--since` or `[config].git_ref`.
fn ensure_ref_for_ref_mode(cfg: &RunConfig) -> Result<()> {
    if cfg.flags.since.is_some() || cfg.git_mode() != GitMode::Ref {
        return Ok(());
    }
    let has_ref = cfg
        .config
        .config
        .git_ref
        .as_deref()
        .is_some_and(|r| !r.trim().is_empty());
    if has_ref {
        Ok(())
    } else {
        Err(PhaserunError::ConfigError(
            "git mode \"ref\" requires --since or [config].git_ref".to_string(),
        ))
    }
}
