// src/schedule/phases.rs

use std::fmt;

use serde::Serialize;

use crate::task::TaskSpec;

/// Lifecycle of one phase during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseState {
    NotStarted,
    Running,
    Completed,
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PhaseState::NotStarted => "not_started",
            PhaseState::Running => "running",
            PhaseState::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Included tasks of one phase, in configuration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseGroup {
    pub name: String,
    pub tasks: Vec<TaskSpec>,
}

impl PhaseGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Split the phase at `wait` markers.
    ///
    /// Each marker gets a segment of its own, so everything listed before it
    /// has finished when it runs and everything after starts once it is done.
    /// Empty segments are dropped.
    pub fn segments(&self) -> Vec<Vec<TaskSpec>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();

        for task in &self.tasks {
            if task.wait {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                segments.push(vec![task.clone()]);
            } else {
                current.push(task.clone());
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

/// Partition tasks into one group per phase of `phase_order`.
///
/// Phases without tasks are kept (they complete immediately). Tasks whose
/// phase is missing from `phase_order` get trailing groups in order of first
/// appearance.
pub fn group_by_phase(tasks: Vec<TaskSpec>, phase_order: &[String]) -> Vec<PhaseGroup> {
    let mut groups: Vec<PhaseGroup> = phase_order.iter().map(PhaseGroup::new).collect();

    for task in tasks {
        match groups.iter_mut().find(|g| g.name == task.phase) {
            Some(group) => group.tasks.push(task),
            None => {
                let mut group = PhaseGroup::new(task.phase.clone());
                group.tasks.push(task);
                groups.push(group);
            }
        }
    }
    groups
}
