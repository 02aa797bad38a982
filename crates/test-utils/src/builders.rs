#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use phaserun::config::{ConfigFile, ConfigSection, DefaultSection, RawConfigFile, TaskConfig};
use phaserun::task::{OutputSpec, TaskSpec};
use phaserun::types::{FixType, GitMode, OutputFormat};

/// Builder for `RawConfigFile` / `ConfigFile` to simplify test setup.
pub struct RawConfigBuilder {
    config: RawConfigFile,
}

impl RawConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                default: DefaultSection::default(),
                task: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, task: TaskConfig) -> Self {
        self.config.task.push(task);
        self
    }

    pub fn git_mode(mut self, mode: GitMode) -> Self {
        self.config.config.git_mode = mode;
        self
    }

    pub fn git_ref(mut self, reference: &str) -> Self {
        self.config.config.git_ref = Some(reference.to_string());
        self
    }

    pub fn phases(mut self, phases: &[&str]) -> Self {
        self.config.config.phases = Some(phases.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn output_root(mut self, root: &str) -> Self {
        self.config.config.output_root = root.to_string();
        self
    }

    pub fn max_parallel(mut self, n: usize) -> Self {
        self.config.config.max_parallel = Some(n);
        self
    }

    pub fn fast_threshold(mut self, secs: u64) -> Self {
        self.config.config.fast_threshold_secs = secs;
        self
    }

    pub fn default_env(mut self, key: &str, value: &str) -> Self {
        self.config
            .default
            .env
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn default_fix_type(mut self, fix: FixType) -> Self {
        self.config.default.fix_type = Some(fix);
        self
    }

    pub fn default_timeout(mut self, secs: u64) -> Self {
        self.config.default.timeout = Some(secs);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for RawConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig` (the `[[task]]` table).
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(id: &str, cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                id: id.to_string(),
                name: None,
                phase: None,
                kind: None,
                cmd: cmd.to_string(),
                workdir: None,
                timeout: None,
                env: BTreeMap::new(),
                watch: Vec::new(),
                fix_type: None,
                fix_cmd: None,
                output: None,
                estimate: None,
                wait: false,
            },
        }
    }

    /// A `wait = true` barrier without a command.
    pub fn wait_marker(id: &str) -> Self {
        let mut b = Self::new(id, "");
        b.task.wait = true;
        b
    }

    pub fn phase(mut self, phase: &str) -> Self {
        self.task.phase = Some(phase.to_string());
        self
    }

    pub fn workdir(mut self, dir: &str) -> Self {
        self.task.workdir = Some(dir.to_string());
        self
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        self.task.watch.push(pattern.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.task.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn timeout(mut self, secs: u64) -> Self {
        self.task.timeout = Some(secs);
        self
    }

    pub fn fix(mut self, fix_type: FixType, fix_cmd: &str) -> Self {
        self.task.fix_type = Some(fix_type);
        self.task.fix_cmd = Some(fix_cmd.to_string());
        self
    }

    pub fn estimate(mut self, secs: u64) -> Self {
        self.task.estimate = Some(secs);
        self
    }

    pub fn output(mut self, format: OutputFormat, path: &str) -> Self {
        self.task.output = Some(OutputSpec {
            format,
            path: path.to_string(),
        });
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Builder for fully-resolved `TaskSpec`s, bypassing config resolution.
pub struct TaskSpecBuilder {
    spec: TaskSpec,
}

impl TaskSpecBuilder {
    pub fn new(id: &str, cmd: &str) -> Self {
        Self {
            spec: TaskSpec {
                id: id.to_string(),
                name: id.to_string(),
                phase: "default".to_string(),
                kind: "command".to_string(),
                command: cmd.to_string(),
                workdir: PathBuf::from("."),
                timeout_secs: 0,
                env: BTreeMap::new(),
                watch: Vec::new(),
                fix_type: FixType::None,
                fix_command: None,
                output: None,
                estimate_secs: None,
                wait: false,
            },
        }
    }

    pub fn wait_marker(id: &str) -> Self {
        let mut b = Self::new(id, "");
        b.spec.wait = true;
        b
    }

    pub fn phase(mut self, phase: &str) -> Self {
        self.spec.phase = phase.to_string();
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spec.workdir = dir.into();
        self
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        self.spec.watch.push(pattern.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.spec.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn timeout(mut self, secs: u64) -> Self {
        self.spec.timeout_secs = secs;
        self
    }

    pub fn fix(mut self, fix_type: FixType, fix_cmd: &str) -> Self {
        self.spec.fix_type = fix_type;
        self.spec.fix_command = Some(fix_cmd.to_string());
        self
    }

    pub fn output(mut self, format: OutputFormat, path: &str) -> Self {
        self.spec.output = Some(OutputSpec {
            format,
            path: path.to_string(),
        });
        self
    }

    pub fn build(self) -> TaskSpec {
        self.spec
    }
}
