// src/engine/runtime.rs

//! Async shell around [`plan_run`]: executes the planned phases and
//! assembles the run record.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::changes::ChangeSource;
use crate::errors::Result;
use crate::exec::{CommandBackend, FixCoordinator};
use crate::record::{ChangeSummary, ResultRecorder, RunRecord};
use crate::schedule::{PhaseScheduler, ScheduleOptions};

use super::plan::plan_run;
use super::RunConfig;

/// Plan and execute one run end to end.
///
/// The returned record is complete but not yet persisted; see
/// [`crate::record::write_run_record`].
pub async fn execute_run<B: CommandBackend>(
    cfg: &RunConfig,
    source: &dyn ChangeSource,
    backend: Arc<B>,
) -> Result<RunRecord> {
    let run_id = Uuid::new_v4().to_string();
    let started_at = Utc::now();
    info!(run_id = %run_id, root = %cfg.repo_root.display(), "run started");

    let plan = plan_run(cfg, source)?;

    let coordinator = FixCoordinator::new(
        backend,
        cfg.repo_root.clone(),
        cfg.log_dir(&run_id),
        cfg.flags.dry_run,
    );
    let scheduler = PhaseScheduler::new(
        coordinator,
        cfg.repo_root.clone(),
        ScheduleOptions {
            fail_fast: cfg.flags.fail_fast,
            max_parallel: cfg.config.config.max_parallel,
        },
    );

    let recorder = ResultRecorder::with_skipped(plan.skipped);
    scheduler.run(plan.phases, &recorder).await;
    let result = recorder.finish();

    info!(
        run_id = %run_id,
        status = %result.status,
        outcomes = result.outcomes.len(),
        "run finished"
    );

    Ok(RunRecord {
        run_id,
        started_at,
        finished_at: Utc::now(),
        flags: cfg.flags.clone(),
        change_set: ChangeSummary::from(&plan.change_set),
        result,
    })
}
