// src/metrics/mod.rs

//! Post-task metrics extracted from a task's declared output file.
//!
//! Each [`OutputFormat`] selects one [`MetricsParser`]. Parsing never
//! influences a task's status: on error the summary is simply left out.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::task::TaskSpec;
use crate::types::OutputFormat;

mod artifact;
mod junit;
mod sarif;

pub use artifact::ArtifactParser;
pub use junit::JunitParser;
pub use sarif::SarifParser;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JunitSummary {
    pub tests: u64,
    pub failures: u64,
    pub errors: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarifSummary {
    pub error: u64,
    pub warning: u64,
    pub note: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub path: PathBuf,
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
}

/// Summary attached to a task outcome, tagged with the output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum MetricsSummary {
    Junit(JunitSummary),
    Sarif(SarifSummary),
    Artifact(ArtifactSummary),
}

pub trait MetricsParser: Send + Sync {
    fn parse(&self, path: &Path, fs: &dyn FileSystem) -> anyhow::Result<MetricsSummary>;
}

static JUNIT: JunitParser = JunitParser;
static SARIF: SarifParser = SarifParser;
static ARTIFACT: ArtifactParser = ArtifactParser;

pub fn parser_for(format: OutputFormat) -> &'static dyn MetricsParser {
    match format {
        OutputFormat::Junit => &JUNIT,
        OutputFormat::Sarif => &SARIF,
        OutputFormat::Artifact => &ARTIFACT,
    }
}

/// Where a task's output file lives: relative paths hang off the task's
/// working directory.
pub fn output_path(spec: &TaskSpec, repo_root: &Path) -> Option<PathBuf> {
    let output = spec.output.as_ref()?;
    let path = Path::new(&output.path);
    Some(if path.is_absolute() {
        path.to_path_buf()
    } else {
        spec.resolved_workdir(repo_root).join(path)
    })
}

/// Run the parser selected by the task's output format, if it declares one.
pub fn collect_metrics(
    spec: &TaskSpec,
    repo_root: &Path,
    fs: &dyn FileSystem,
) -> Option<MetricsSummary> {
    let output = spec.output.as_ref()?;
    let path = output_path(spec, repo_root)?;

    match parser_for(output.format).parse(&path, fs) {
        Ok(summary) => {
            debug!(task = %spec.id, path = %path.display(), ?summary, "collected metrics");
            Some(summary)
        }
        Err(e) => {
            warn!(
                task = %spec.id,
                path = %path.display(),
                error = %e,
                "failed to parse task output; omitting metrics"
            );
            None
        }
    }
}
