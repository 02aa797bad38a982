// src/exec/fix.rs

//! Fix coordination around a task's command.
//!
//! One pass per task, never looping:
//!
//! 1. run the command; PASS ends here
//! 2. FAIL with no fix (or `fix_type = "none"`) ends here
//! 3. FAIL with `fix_type = "helper"` ends here, surfacing the fix command
//! 4. FAIL with `fix_type = "auto"` runs the fix once, then the command once
//!    more; the re-run decides the final status

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::record::outcome::{TaskOutcome, DRY_RUN_REASON};
use crate::task::TaskSpec;
use crate::types::{FixType, TaskStatus};

use super::backend::{CommandBackend, CommandInvocation, CommandResult, InvocationKind};

#[derive(Debug)]
pub struct FixCoordinator<B: CommandBackend> {
    backend: Arc<B>,
    repo_root: PathBuf,
    log_dir: PathBuf,
    dry_run: bool,
}

impl<B: CommandBackend> FixCoordinator<B> {
    pub fn new(
        backend: Arc<B>,
        repo_root: impl Into<PathBuf>,
        log_dir: impl Into<PathBuf>,
        dry_run: bool,
    ) -> Self {
        Self {
            backend,
            repo_root: repo_root.into(),
            log_dir: log_dir.into(),
            dry_run,
        }
    }

    pub fn log_path_for(&self, spec: &TaskSpec) -> PathBuf {
        self.log_dir.join(format!("{}.log", spec.id))
    }

    /// Run one included task to its final outcome.
    pub async fn run(&self, spec: &TaskSpec) -> TaskOutcome {
        if !spec.has_command() {
            // Bare `wait` marker: a synchronisation point with nothing to run.
            return barrier_outcome(spec);
        }

        if self.dry_run {
            info!(task = %spec.id, cmd = %spec.command, "dry run: not executing");
            return TaskOutcome::skipped(spec, DRY_RUN_REASON);
        }

        let log_path = self.log_path_for(spec);
        let initial = self
            .invoke(spec, InvocationKind::Check, &spec.command, &log_path)
            .await;

        let mut outcome = outcome_from_result(spec, &initial, &log_path);
        outcome.initial_exit_code = initial.exit_code();

        if initial.passed() {
            return outcome;
        }

        let Some(fix_command) = spec.fix_command() else {
            return outcome;
        };

        match spec.fix_type {
            FixType::None => outcome,
            FixType::Helper => {
                info!(task = %spec.id, suggestion = %fix_command, "helper fix available");
                outcome.fix_suggestion = Some(fix_command.to_string());
                outcome
            }
            FixType::Auto => self.auto_fix(spec, fix_command, &initial, &log_path).await,
        }
    }

    async fn auto_fix(
        &self,
        spec: &TaskSpec,
        fix_command: &str,
        initial: &CommandResult,
        log_path: &Path,
    ) -> TaskOutcome {
        info!(task = %spec.id, fix = %fix_command, "check failed; running auto-fix");
        let fix = self
            .invoke(spec, InvocationKind::Fix, fix_command, log_path)
            .await;
        if !fix.passed() {
            // The re-run still happens; its result is what counts.
            warn!(
                task = %spec.id,
                exit_code = fix.exit_code(),
                "auto-fix command failed"
            );
        }

        let recheck = self
            .invoke(spec, InvocationKind::Recheck, &spec.command, log_path)
            .await;

        let mut outcome = outcome_from_result(spec, &recheck, log_path);
        outcome.auto_fixed = true;
        outcome.initial_exit_code = initial.exit_code();
        outcome.started_at = Some(initial.started_at);
        outcome.duration_ms = millis(initial.duration + fix.duration + recheck.duration);
        outcome.fix_duration_ms = Some(millis(fix.duration));
        outcome.recheck_duration_ms = Some(millis(recheck.duration));

        info!(
            task = %spec.id,
            status = %outcome.status,
            "auto-fix recheck finished"
        );
        outcome
    }

    async fn invoke(
        &self,
        spec: &TaskSpec,
        kind: InvocationKind,
        command: &str,
        log_path: &Path,
    ) -> CommandResult {
        let invocation = CommandInvocation {
            task_id: spec.id.clone(),
            kind,
            command: command.to_string(),
            workdir: spec.resolved_workdir(&self.repo_root),
            env: spec.env.clone(),
            timeout: spec.timeout(),
            log_path: log_path.to_path_buf(),
        };
        self.backend.run_command(&invocation).await
    }
}

fn outcome_from_result(spec: &TaskSpec, result: &CommandResult, log_path: &Path) -> TaskOutcome {
    let status = if result.passed() {
        TaskStatus::Pass
    } else {
        TaskStatus::Fail
    };

    TaskOutcome {
        status,
        exit_code: result.exit_code(),
        message: result.message.clone(),
        started_at: Some(result.started_at),
        ended_at: Some(result.finished_at),
        duration_ms: millis(result.duration),
        log_path: Some(log_path.to_path_buf()),
        ..TaskOutcome::blank(spec)
    }
}

fn barrier_outcome(spec: &TaskSpec) -> TaskOutcome {
    let now = chrono::Utc::now();
    TaskOutcome {
        status: TaskStatus::Pass,
        started_at: Some(now),
        ended_at: Some(now),
        ..TaskOutcome::blank(spec)
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}
