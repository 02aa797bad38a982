// src/changes/git.rs

//! Changed-file listing backed by `git2`.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use git2::{Diff, ErrorCode, Repository, StatusOptions, Tree};
use tracing::debug;

use crate::changes::path_utils::{normalize_rel, relative_str};
use crate::types::GitMode;

/// Source of changed files for a given mode/ref.
///
/// Paths are relative to the repository root the source was created for,
/// using forward slashes. Errors are never fatal for a run; callers degrade
/// them to an empty change set.
pub trait ChangeSource: Send + Sync {
    fn changed_files(&self, mode: GitMode, reference: Option<&str>) -> Result<Vec<String>>;
}

/// Production [`ChangeSource`] reading the git repository containing
/// `repo_root`.
#[derive(Debug, Clone)]
pub struct GitChangeSource {
    repo_root: PathBuf,
}

impl GitChangeSource {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }
}

impl ChangeSource for GitChangeSource {
    fn changed_files(&self, mode: GitMode, reference: Option<&str>) -> Result<Vec<String>> {
        if mode == GitMode::None {
            return Ok(Vec::new());
        }

        let repo = open_repo_discover(&self.repo_root)?;
        let head_tree = head_tree(&repo)?;

        let git_paths = match mode {
            GitMode::None => Vec::new(),
            GitMode::Staged => {
                let diff = repo
                    .diff_tree_to_index(Some(&head_tree), None, None)
                    .context("diffing HEAD against the index")?;
                diff_paths(&diff)
            }
            GitMode::StagedUnstaged => status_paths(&repo)?,
            GitMode::Ref => {
                let reference = reference
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .ok_or_else(|| anyhow!("git mode 'ref' needs a ref to compare against"))?;
                let base_tree = repo
                    .revparse_single(reference)
                    .and_then(|obj| obj.peel_to_tree())
                    .with_context(|| format!("resolving ref '{reference}'"))?;
                let diff = repo
                    .diff_tree_to_tree(Some(&base_tree), Some(&head_tree), None)
                    .with_context(|| format!("diffing '{reference}' against HEAD"))?;
                diff_paths(&diff)
            }
        };

        let files = rebase_onto_root(&repo, &self.repo_root, git_paths)?;
        debug!(%mode, count = files.len(), "git changed files");
        Ok(files)
    }
}

fn open_repo_discover(repo_path: &Path) -> Result<Repository> {
    Repository::discover(repo_path).with_context(|| {
        format!(
            "Failed to open repository from path '{}'",
            repo_path.display()
        )
    })
}

/// Tree of `HEAD`. A repository without commits is an error here, which the
/// caller turns into an empty change set.
fn head_tree(repo: &Repository) -> Result<Tree<'_>> {
    let head = match repo.head() {
        Ok(head) => head,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Err(anyhow!("repository has no commits yet"));
        }
        Err(e) => return Err(e).context("Failed to get HEAD"),
    };
    head.peel_to_tree().context("Failed to resolve HEAD tree")
}

fn diff_paths(diff: &Diff<'_>) -> Vec<String> {
    let mut paths = Vec::new();
    for delta in diff.deltas() {
        for file in [delta.old_file(), delta.new_file()] {
            if let Some(path) = file.path() {
                paths.push(path.to_string_lossy().replace('\\', "/"));
            }
        }
    }
    paths
}

/// Staged, unstaged and untracked paths, old names of renames included.
fn status_paths(repo: &Repository) -> Result<Vec<String>> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true);
    opts.recurse_untracked_dirs(true);
    opts.include_ignored(false);
    opts.include_unmodified(false);
    opts.exclude_submodules(true);
    opts.renames_head_to_index(true);

    let statuses = repo.statuses(Some(&mut opts)).context("reading git status")?;

    let mut paths = Vec::new();
    for entry in statuses.iter() {
        if entry.status().is_ignored() {
            continue;
        }
        if let Some(path) = entry.path() {
            paths.push(path.to_string());
        }
        if let Some(delta) = entry.head_to_index() {
            if let Some(old) = delta.old_file().path() {
                paths.push(old.to_string_lossy().replace('\\', "/"));
            }
        }
    }
    Ok(paths)
}

/// Git reports paths relative to its workdir; the engine wants them relative
/// to the configured repository root, which may be a subdirectory.
fn rebase_onto_root(repo: &Repository, repo_root: &Path, paths: Vec<String>) -> Result<Vec<String>> {
    let workdir = repo
        .workdir()
        .ok_or_else(|| anyhow!("bare repositories are not supported"))?;

    let prefix = relative_str(workdir, repo_root)
        .map(|rel| normalize_rel(Path::new(&rel)))
        .ok_or_else(|| {
            anyhow!(
                "'{}' is not inside the git work tree '{}'",
                repo_root.display(),
                workdir.display()
            )
        })?;

    if prefix.is_empty() {
        return Ok(paths);
    }

    let prefix = format!("{prefix}/");
    Ok(paths
        .into_iter()
        .filter_map(|p| p.strip_prefix(&prefix).map(str::to_string))
        .collect())
}
