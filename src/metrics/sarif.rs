// src/metrics/sarif.rs

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

use super::{MetricsParser, MetricsSummary, SarifSummary};
use crate::fs::FileSystem;

/// Counts SARIF results per level. A result without a level is a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct SarifParser;

impl MetricsParser for SarifParser {
    fn parse(&self, path: &Path, fs: &dyn FileSystem) -> Result<MetricsSummary> {
        let text = fs.read_to_string(path)?;
        Ok(MetricsSummary::Sarif(summarize(&text)?))
    }
}

fn summarize(text: &str) -> Result<SarifSummary> {
    let doc: Value = serde_json::from_str(text).context("parsing SARIF json")?;
    let runs = doc
        .get("runs")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("SARIF document has no `runs` array"))?;

    let mut summary = SarifSummary::default();
    let results = runs
        .iter()
        .filter_map(|run| run.get("results").and_then(Value::as_array))
        .flatten();

    for result in results {
        match result.get("level").and_then(Value::as_str) {
            Some("error") => summary.error += 1,
            Some("note") => summary.note += 1,
            Some("warning") | None => summary.warning += 1,
            // "none" and unknown levels are not counted
            Some(_) => {}
        }
    }
    Ok(summary)
}
