// src/config/validate.rs

use std::collections::HashSet;

use globset::GlobBuilder;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PhaserunError, Result};
use crate::types::GitMode;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PhaserunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.default, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_ids(cfg)?;
    validate_task_commands(cfg)?;
    validate_phases(cfg)?;
    validate_watch_globs(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(PhaserunError::ConfigError(
            "config must contain at least one [[task]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.max_parallel == Some(0) {
        return Err(PhaserunError::ConfigError(
            "[config].max_parallel must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.config.git_mode == GitMode::Ref
        && cfg.config.git_ref.as_deref().is_none_or(|r| r.trim().is_empty())
    {
        return Err(PhaserunError::ConfigError(
            "[config].git_mode = \"ref\" requires [config].git_ref".to_string(),
        ));
    }

    if cfg.config.output_root.trim().is_empty() {
        return Err(PhaserunError::ConfigError(
            "[config].output_root must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_task_ids(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for task in &cfg.task {
        let id = task.id.trim();
        if id.is_empty() {
            return Err(PhaserunError::ConfigError(
                "every [[task]] needs a non-empty `id`".to_string(),
            ));
        }
        if id.contains('/') || id.contains('\\') {
            return Err(PhaserunError::ConfigError(format!(
                "task id '{id}' must not contain path separators"
            )));
        }
        if !seen.insert(id) {
            return Err(PhaserunError::ConfigError(format!(
                "duplicate task id '{id}'"
            )));
        }
    }
    Ok(())
}

fn validate_task_commands(cfg: &RawConfigFile) -> Result<()> {
    for task in &cfg.task {
        if task.cmd.trim().is_empty() && !task.wait {
            return Err(PhaserunError::ConfigError(format!(
                "task '{}' has an empty `cmd` (only `wait = true` markers may omit it)",
                task.id
            )));
        }
    }
    Ok(())
}

fn validate_phases(cfg: &RawConfigFile) -> Result<()> {
    let Some(phases) = &cfg.config.phases else {
        return Ok(());
    };

    let mut seen = HashSet::new();
    for phase in phases {
        if !seen.insert(phase.as_str()) {
            return Err(PhaserunError::ConfigError(format!(
                "phase '{phase}' listed twice in [config].phases"
            )));
        }
    }

    for task in &cfg.task {
        let phase = task.phase_name();
        if !seen.contains(phase) {
            return Err(PhaserunError::ConfigError(format!(
                "task '{}' uses unknown phase '{}' (not in [config].phases)",
                task.id, phase
            )));
        }
    }

    Ok(())
}

fn validate_watch_globs(cfg: &RawConfigFile) -> Result<()> {
    for task in &cfg.task {
        for pattern in &task.watch {
            GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| {
                    PhaserunError::ConfigError(format!(
                        "task '{}' has invalid watch pattern '{}': {}",
                        task.id, pattern, e
                    ))
                })?;
        }
    }
    Ok(())
}
