// src/metrics/artifact.rs

use std::path::Path;

use anyhow::Result;

use super::{ArtifactSummary, MetricsParser, MetricsSummary};
use crate::fs::FileSystem;

/// Records whether a build artifact was produced, and its size.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactParser;

impl MetricsParser for ArtifactParser {
    fn parse(&self, path: &Path, fs: &dyn FileSystem) -> Result<MetricsSummary> {
        let exists = fs.is_file(path);
        let bytes = if exists {
            Some(fs.file_size(path)?)
        } else {
            None
        };
        Ok(MetricsSummary::Artifact(ArtifactSummary {
            path: path.to_path_buf(),
            exists,
            bytes,
        }))
    }
}
