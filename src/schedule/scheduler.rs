// src/schedule/scheduler.rs

//! Runs phase groups with barriers between them.
//!
//! One coordinating future owns the run. For every segment it spawns one
//! tokio task per included task into a `JoinSet` and drains the set before
//! moving on, so no task outlives its phase.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tracing::{debug, error, info, warn};

use crate::exec::{CommandBackend, FixCoordinator};
use crate::fs::{FileSystem, RealFileSystem};
use crate::metrics::collect_metrics;
use crate::record::{ResultRecorder, TaskOutcome};
use crate::task::TaskSpec;
use crate::types::TaskStatus;

use super::phases::{PhaseGroup, PhaseState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleOptions {
    pub fail_fast: bool,
    /// Upper bound on concurrently running tasks within a segment.
    pub max_parallel: Option<usize>,
}

/// Final state of one phase after [`PhaseScheduler::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    pub name: String,
    pub state: PhaseState,
    pub tasks: usize,
}

pub struct PhaseScheduler<B: CommandBackend> {
    coordinator: Arc<FixCoordinator<B>>,
    fs: Arc<dyn FileSystem>,
    repo_root: PathBuf,
    options: ScheduleOptions,
}

impl<B: CommandBackend> PhaseScheduler<B> {
    pub fn new(
        coordinator: FixCoordinator<B>,
        repo_root: impl Into<PathBuf>,
        options: ScheduleOptions,
    ) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            fs: Arc::new(RealFileSystem),
            repo_root: repo_root.into(),
            options,
        }
    }

    /// Read task output files through `fs` instead of the real filesystem.
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Run every phase in order, recording each outcome as it completes.
    ///
    /// With fail-fast, a failure stops the run at the next segment or phase
    /// boundary. Tasks already in flight still finish; tasks that never start
    /// get no outcome.
    pub async fn run(&self, phases: Vec<PhaseGroup>, recorder: &ResultRecorder) -> Vec<PhaseReport> {
        let semaphore = self
            .options
            .max_parallel
            .map(|n| Arc::new(Semaphore::new(n.max(1))));

        let mut reports: Vec<PhaseReport> = phases
            .iter()
            .map(|p| PhaseReport {
                name: p.name.clone(),
                state: PhaseState::NotStarted,
                tasks: p.len(),
            })
            .collect();

        for (idx, phase) in phases.into_iter().enumerate() {
            if self.should_stop(recorder) {
                info!(
                    phase = %phase.name,
                    "fail-fast: earlier failure; not starting remaining phases"
                );
                break;
            }

            if phase.is_empty() {
                debug!(phase = %phase.name, "phase has no tasks; completed");
                reports[idx].state = PhaseState::Completed;
                continue;
            }

            reports[idx].state = PhaseState::Running;
            info!(phase = %phase.name, tasks = phase.len(), "phase started");

            let mut aborted = false;
            for (seg_idx, segment) in phase.segments().into_iter().enumerate() {
                if seg_idx > 0 && self.should_stop(recorder) {
                    info!(
                        phase = %phase.name,
                        "fail-fast: failure before wait marker; not starting rest of phase"
                    );
                    aborted = true;
                    break;
                }
                self.run_segment(segment, semaphore.clone(), recorder).await;
            }

            // A phase cut short by fail-fast never reaches its barrier.
            if !aborted {
                reports[idx].state = PhaseState::Completed;
            }
            info!(
                phase = %phase.name,
                state = %reports[idx].state,
                failed = recorder.has_failure(),
                "phase finished"
            );
        }

        reports
    }

    fn should_stop(&self, recorder: &ResultRecorder) -> bool {
        self.options.fail_fast && recorder.has_failure()
    }

    async fn run_segment(
        &self,
        segment: Vec<TaskSpec>,
        semaphore: Option<Arc<Semaphore>>,
        recorder: &ResultRecorder,
    ) {
        let mut set: JoinSet<TaskOutcome> = JoinSet::new();
        let mut in_flight: HashMap<Id, TaskSpec> = HashMap::new();

        for spec in segment {
            let coordinator = Arc::clone(&self.coordinator);
            let fs = Arc::clone(&self.fs);
            let repo_root = self.repo_root.clone();
            let semaphore = semaphore.clone();
            let task_spec = spec.clone();

            let handle = set.spawn(async move {
                // Held until the task, fix and recheck are all done.
                let _permit = match semaphore {
                    Some(sem) => sem.acquire_owned().await.ok(),
                    None => None,
                };

                let mut outcome = coordinator.run(&task_spec).await;
                if matches!(outcome.status, TaskStatus::Pass | TaskStatus::Fail) {
                    outcome.metrics = collect_metrics(&task_spec, &repo_root, fs.as_ref());
                }
                outcome
            });
            in_flight.insert(handle.id(), spec);
        }

        while let Some(joined) = set.join_next_with_id().await {
            let outcome = match joined {
                Ok((id, outcome)) => {
                    in_flight.remove(&id);
                    outcome
                }
                Err(err) => {
                    let Some(spec) = in_flight.remove(&err.id()) else {
                        error!(error = %err, "unknown task failed to join");
                        continue;
                    };
                    error!(task = %spec.id, error = %err, "task runner panicked");
                    panicked_outcome(&spec, &err.to_string())
                }
            };

            if outcome.is_failure() {
                warn!(
                    task = %outcome.id,
                    phase = %outcome.phase,
                    exit_code = ?outcome.exit_code,
                    message = outcome.message.as_deref().unwrap_or(""),
                    "task failed"
                );
            } else {
                info!(
                    task = %outcome.id,
                    phase = %outcome.phase,
                    status = %outcome.status,
                    duration_ms = outcome.duration_ms,
                    "task finished"
                );
            }
            recorder.record(outcome);
        }
    }
}

fn panicked_outcome(spec: &TaskSpec, error: &str) -> TaskOutcome {
    TaskOutcome {
        status: TaskStatus::Fail,
        message: Some(format!("task runner panicked: {error}")),
        ..TaskOutcome::blank(spec)
    }
}
