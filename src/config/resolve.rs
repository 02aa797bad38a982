// src/config/resolve.rs

//! Turn a validated [`ConfigFile`] into engine-ready [`TaskSpec`]s.
//!
//! All layering happens here, once:
//! - env: `[default].env` overlaid by the task's `env` (task keys win)
//! - fix type: CLI `--fix-type` override, else task, else `[default]`
//! - timeout / workdir: task value, else `[default]`

use std::path::PathBuf;

use crate::config::model::{ConfigFile, TaskConfig};
use crate::task::TaskSpec;
use crate::types::FixType;

/// Type tag used when a task does not set `type`.
pub const DEFAULT_KIND: &str = "command";

pub fn resolve_tasks(cfg: &ConfigFile, fix_type_override: Option<FixType>) -> Vec<TaskSpec> {
    cfg.tasks()
        .iter()
        .map(|task| resolve_task(cfg, task, fix_type_override))
        .collect()
}

fn resolve_task(cfg: &ConfigFile, task: &TaskConfig, fix_type_override: Option<FixType>) -> TaskSpec {
    let defaults = cfg.default_section();

    let mut env = defaults.env.clone();
    env.extend(task.env.iter().map(|(k, v)| (k.clone(), v.clone())));

    let fix_type = fix_type_override
        .or(task.fix_type)
        .or(defaults.fix_type)
        .unwrap_or_default();

    let non_blank = |w: &&str| !w.trim().is_empty();
    let workdir = task
        .workdir
        .as_deref()
        .filter(non_blank)
        .or(defaults.workdir.as_deref().filter(non_blank))
        .unwrap_or(".");

    TaskSpec {
        id: task.id.trim().to_string(),
        name: task.name.clone().unwrap_or_else(|| task.id.trim().to_string()),
        phase: task.phase_name().to_string(),
        kind: task.kind.clone().unwrap_or_else(|| DEFAULT_KIND.to_string()),
        command: task.cmd.clone(),
        workdir: PathBuf::from(workdir),
        timeout_secs: task.timeout.or(defaults.timeout).unwrap_or(0),
        env,
        watch: task.watch.clone(),
        fix_type,
        fix_command: task.fix_cmd.clone(),
        output: task.output.clone(),
        estimate_secs: task.estimate,
        wait: task.wait,
    }
}
