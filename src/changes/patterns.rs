// src/changes/patterns.rs

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::changes::path_utils::{normalize_rel, relative_str};
use crate::task::{TaskId, TaskSpec};

/// Compiled watch patterns for a single task.
///
/// Patterns are written relative to the task's working directory and compiled
/// relative to the repository root, so `src/**/*.ts` under workdir
/// `frontend` becomes `frontend/src/**/*.ts`. The change set hands in
/// repository-relative paths (e.g. `"frontend/src/app.ts"`).
#[derive(Clone)]
pub struct TaskWatchProfile {
    id: TaskId,
    /// Effective patterns after joining with the workdir.
    patterns: Vec<String>,
    watch_set: GlobSet,
}

impl fmt::Debug for TaskWatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskWatchProfile")
            .field("id", &self.id)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl TaskWatchProfile {
    /// Returns true if the given repository-relative path is watched.
    pub fn matches(&self, rel_path: &str) -> bool {
        let rel_path = rel_path.strip_prefix("./").unwrap_or(rel_path);
        self.watch_set.is_match(rel_path)
    }

    /// Returns true if any of the given paths is watched.
    pub fn matches_any<'a>(&self, paths: impl IntoIterator<Item = &'a String>) -> bool {
        paths.into_iter().any(|p| self.matches(p))
    }
}

/// Compile a task's watch globs, anchored at its working directory.
pub fn build_task_watch_profile(spec: &TaskSpec, repo_root: &Path) -> Result<TaskWatchProfile> {
    let base = workdir_prefix(spec, repo_root);

    let patterns: Vec<String> = spec
        .watch
        .iter()
        .map(|pattern| join_pattern(&base, pattern))
        .collect();

    let watch_set = build_globset(&patterns)
        .with_context(|| format!("building watch globset for task {}", spec.id))?;

    Ok(TaskWatchProfile {
        id: spec.id.clone(),
        patterns,
        watch_set,
    })
}

/// Repository-relative prefix for a task's working directory, escaped so
/// that directory names are matched literally.
///
/// Absolute workdirs under the repository root are made relative to it.
/// Absolute workdirs outside the root keep their absolute form; their
/// patterns then simply never match repository-relative paths.
fn workdir_prefix(spec: &TaskSpec, repo_root: &Path) -> String {
    let prefix = if spec.workdir.is_absolute() {
        match relative_str(repo_root, &spec.workdir) {
            Some(rel) => normalize_rel(Path::new(&rel)),
            None => spec.workdir.to_string_lossy().replace('\\', "/"),
        }
    } else {
        normalize_rel(&spec.workdir)
    };
    globset::escape(&prefix)
}

fn join_pattern(base: &str, pattern: &str) -> String {
    let pattern = pattern.trim();
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
    if base.is_empty() {
        pattern.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), pattern)
    }
}

/// Build a GlobSet where `*` stays within one path segment and `**` spans
/// directories.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
