// src/record/report.rs

//! The persisted run record and the short human summary.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::changes::ChangeSet;
use crate::engine::RunFlags;
use crate::record::recorder::RunResult;
use crate::types::{GitMode, TaskStatus};

pub const RESULT_FILE: &str = "result.json";
pub const LATEST_FILE: &str = "latest.json";

/// What the change selector worked from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    pub mode: GitMode,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub changed_files: usize,
}

impl From<&ChangeSet> for ChangeSummary {
    fn from(set: &ChangeSet) -> Self {
        Self {
            mode: set.mode,
            reference: set.reference.clone(),
            changed_files: set.len(),
        }
    }
}

/// Canonical record of one run, consumed by reporters and dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub flags: RunFlags,
    pub change_set: ChangeSummary,
    pub result: RunResult,
}

/// Write `<output_root>/<run_id>/result.json` and refresh
/// `<output_root>/latest.json`. Returns the path of the per-run file.
pub fn write_run_record(record: &RunRecord, output_root: &Path) -> Result<PathBuf> {
    let run_dir = output_root.join(&record.run_id);
    fs::create_dir_all(&run_dir).with_context(|| format!("creating dir {:?}", run_dir))?;

    let json = serde_json::to_string_pretty(record).context("serializing run record")?;

    let result_path = run_dir.join(RESULT_FILE);
    fs::write(&result_path, &json).with_context(|| format!("writing {:?}", result_path))?;

    let latest_path = output_root.join(LATEST_FILE);
    fs::write(&latest_path, &json).with_context(|| format!("writing {:?}", latest_path))?;

    info!(path = %result_path.display(), "wrote run record");
    Ok(result_path)
}

/// Read back a record written by [`write_run_record`].
pub fn read_run_record(path: &Path) -> Result<RunRecord> {
    let json = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    serde_json::from_str(&json).with_context(|| format!("parsing run record {:?}", path))
}

/// Plain-text summary printed at the end of a run.
pub fn render_summary(record: &RunRecord) -> String {
    let mut out = String::new();
    let result = &record.result;

    let _ = writeln!(out, "phaserun {}", record.run_id);
    let _ = writeln!(
        out,
        "  changes: mode={} changed_files={}",
        record.change_set.mode, record.change_set.changed_files
    );

    for o in &result.outcomes {
        let detail = match o.status {
            TaskStatus::Skipped => o.skip_reason.clone().unwrap_or_default(),
            _ => {
                let mut d = format!("{}ms", o.duration_ms);
                if o.auto_fixed {
                    d.push_str(", auto-fixed");
                }
                if let Some(msg) = &o.message {
                    let _ = write!(d, ", {msg}");
                }
                if let Some(fix) = &o.fix_suggestion {
                    let _ = write!(d, ", try: {fix}");
                }
                d
            }
        };
        let _ = writeln!(out, "  {:<8} {:<24} {}", o.status, o.id, detail);
    }

    let _ = writeln!(
        out,
        "{}: {} passed, {} failed, {} skipped",
        result.status,
        result.count_where(|o| o.status == TaskStatus::Pass),
        result.count_where(|o| o.status == TaskStatus::Fail),
        result.count_where(|o| o.status == TaskStatus::Skipped),
    );
    out
}
