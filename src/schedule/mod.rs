// src/schedule/mod.rs

//! Phase scheduling.
//!
//! - [`phases`] partitions included tasks into ordered phase groups and splits
//!   each group into wait segments.
//! - [`scheduler`] runs the groups: phases strictly in sequence, the tasks of
//!   a segment concurrently, with an optional fail-fast gate between them.

pub mod phases;
pub mod scheduler;

pub use phases::{group_by_phase, PhaseGroup, PhaseState};
pub use scheduler::{PhaseReport, PhaseScheduler, ScheduleOptions};
