// src/types.rs

//! Small strongly-typed vocabularies shared by config, engine and record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the change set is derived from git.
///
/// - `None`: no git inspection; the change set is empty and every task runs.
/// - `Staged`: files staged in the index relative to `HEAD`.
/// - `StagedUnstaged`: staged files plus worktree modifications and untracked
///   files.
/// - `Ref`: files that differ between a given ref and `HEAD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GitMode {
    None,
    Staged,
    StagedUnstaged,
    Ref,
}

impl Default for GitMode {
    fn default() -> Self {
        GitMode::None
    }
}

impl FromStr for GitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(GitMode::None),
            "staged" => Ok(GitMode::Staged),
            "staged_unstaged" | "staged-unstaged" => Ok(GitMode::StagedUnstaged),
            "ref" => Ok(GitMode::Ref),
            other => Err(format!(
                "invalid git mode: {other} (expected \"none\", \"staged\", \"staged_unstaged\" or \"ref\")"
            )),
        }
    }
}

impl fmt::Display for GitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GitMode::None => "none",
            GitMode::Staged => "staged",
            GitMode::StagedUnstaged => "staged_unstaged",
            GitMode::Ref => "ref",
        };
        f.write_str(s)
    }
}

/// Remediation applied when a task's check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FixType {
    /// No remediation; the failure stands.
    None,
    /// Run the fix command once, then re-run the check exactly once.
    Auto,
    /// Surface the fix command as a suggestion, never execute it.
    Helper,
}

impl Default for FixType {
    fn default() -> Self {
        FixType::None
    }
}

impl FromStr for FixType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(FixType::None),
            "auto" => Ok(FixType::Auto),
            "helper" => Ok(FixType::Helper),
            other => Err(format!(
                "invalid fix type: {other} (expected \"auto\", \"helper\" or \"none\")"
            )),
        }
    }
}

/// Final status of one task in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Pass,
    Fail,
    Skipped,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pass => "PASS",
            TaskStatus::Fail => "FAIL",
            TaskStatus::Skipped => "SKIPPED",
        };
        f.write_str(s)
    }
}

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Pass,
    Fail,
}

impl RunStatus {
    pub fn is_success(self) -> bool {
        matches!(self, RunStatus::Pass)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Pass => f.write_str("PASS"),
            RunStatus::Fail => f.write_str("FAIL"),
        }
    }
}

/// Format of the output file a task produces for metrics collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Junit,
    Sarif,
    Artifact,
}
