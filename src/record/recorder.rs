// src/record/recorder.rs

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::record::outcome::TaskOutcome;
use crate::types::RunStatus;

/// Ordered outcomes of a run plus the derived overall status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,
    pub outcomes: Vec<TaskOutcome>,
}

impl RunResult {
    pub fn from_outcomes(outcomes: Vec<TaskOutcome>) -> Self {
        let status = if outcomes.iter().any(TaskOutcome::is_failure) {
            RunStatus::Fail
        } else {
            RunStatus::Pass
        };
        Self { status, outcomes }
    }

    pub fn outcome(&self, id: &str) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }

    pub fn count_where(&self, pred: impl Fn(&TaskOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Synchronized accumulator for outcomes produced by concurrent tasks.
///
/// Cloning shares the same underlying list. Appends happen in completion
/// order.
#[derive(Debug, Clone, Default)]
pub struct ResultRecorder {
    outcomes: Arc<Mutex<Vec<TaskOutcome>>>,
}

impl ResultRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the outcomes of tasks filtered out before scheduling.
    pub fn with_skipped(skipped: Vec<TaskOutcome>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(skipped)),
        }
    }

    pub fn record(&self, outcome: TaskOutcome) {
        self.lock().push(outcome);
    }

    pub fn has_failure(&self) -> bool {
        self.lock().iter().any(TaskOutcome::is_failure)
    }

    pub fn snapshot(&self) -> Vec<TaskOutcome> {
        self.lock().clone()
    }

    pub fn finish(&self) -> RunResult {
        RunResult::from_outcomes(self.snapshot())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TaskOutcome>> {
        // A panic while holding the lock cannot leave a half-pushed Vec.
        self.outcomes.lock().unwrap_or_else(|e| e.into_inner())
    }
}
