// src/record/mod.rs

//! Task outcomes, their synchronized accumulation, and the persisted run
//! record.

pub mod outcome;
pub mod recorder;
pub mod report;

pub use outcome::{TaskOutcome, DRY_RUN_REASON};
pub use recorder::{ResultRecorder, RunResult};
pub use report::{read_run_record, render_summary, write_run_record, ChangeSummary, RunRecord};
