#![allow(dead_code)]

use std::path::Path;

use git2::{IndexAddOption, Repository, Signature};

pub use phaserun_test_utils::builders::{RawConfigBuilder, TaskConfigBuilder, TaskSpecBuilder};
pub use phaserun_test_utils::{
    init_tracing, with_timeout, FakeBackend, FakeResponse, StaticChangeSource,
};

use phaserun::engine::{RunConfig, RunFlags};
use phaserun::config::ConfigFile;

pub fn run_config(root: &Path, config: ConfigFile, flags: RunFlags) -> RunConfig {
    RunConfig::new(root, config, flags)
}

pub fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// Initialise an empty repository at `root`.
pub fn init_repo(root: &Path) -> Repository {
    Repository::init(root).unwrap()
}

/// Stage everything under the work tree.
pub fn stage_all(repo: &Repository) {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
}

/// Stage everything and commit it on top of HEAD (if any).
pub fn commit_all(repo: &Repository, message: &str) -> git2::Oid {
    stage_all(repo);
    let mut index = repo.index().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = Signature::now("phaserun tests", "tests@example.com").unwrap();

    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}
