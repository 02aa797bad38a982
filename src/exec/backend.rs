// src/exec/backend.rs

//! Pluggable command backend abstraction.
//!
//! The fix coordinator talks to a `CommandBackend` instead of spawning
//! processes directly. Production uses [`ProcessBackend`]; tests can swap in
//! a scripted backend that records invocations and returns canned results
//! without touching the OS.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::task::TaskId;

use super::process::run_command;

/// Which step of a task's lifecycle an invocation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationKind {
    /// First run of the task's command.
    Check,
    /// The auto-fix command.
    Fix,
    /// The single re-run of the command after an auto-fix.
    Recheck,
}

impl fmt::Display for InvocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationKind::Check => f.write_str("check"),
            InvocationKind::Fix => f.write_str("fix"),
            InvocationKind::Recheck => f.write_str("recheck"),
        }
    }
}

/// Everything needed to run one shell command for one task.
#[derive(Debug, Clone)]
pub struct CommandInvocation {
    pub task_id: TaskId,
    pub kind: InvocationKind,
    pub command: String,
    /// Already resolved against the repository root.
    pub workdir: PathBuf,
    /// Overlaid on top of the inherited process environment.
    pub env: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
    /// Appended to; created along with its parent directories if missing.
    pub log_path: PathBuf,
}

/// How a command invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandExit {
    /// The process exited on its own with this code.
    Exited(i32),
    /// The process was terminated by a signal it did not ask for.
    Killed,
    /// The deadline elapsed and the process tree was killed.
    TimedOut,
    /// The program could not be found; no process was started.
    CommandNotFound,
    /// The working directory does not exist; no process was started.
    WorkdirMissing,
    /// Any other spawn or log-file error; no process was started.
    SpawnFailed,
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit: CommandExit,
    /// Classified, human-readable failure description.
    pub message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration: Duration,
}

impl CommandResult {
    pub fn passed(&self) -> bool {
        matches!(self.exit, CommandExit::Exited(0))
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.exit {
            CommandExit::Exited(code) => Some(code),
            _ => None,
        }
    }
}

/// Trait abstracting how a single command is executed.
pub trait CommandBackend: Send + Sync + 'static {
    fn run_command<'a>(
        &'a self,
        invocation: &'a CommandInvocation,
    ) -> Pin<Box<dyn Future<Output = CommandResult> + Send + 'a>>;
}

/// Real backend: spawns `sh -c` processes (see [`super::process`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessBackend;

impl ProcessBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CommandBackend for ProcessBackend {
    fn run_command<'a>(
        &'a self,
        invocation: &'a CommandInvocation,
    ) -> Pin<Box<dyn Future<Output = CommandResult> + Send + 'a>> {
        Box::pin(run_command(invocation))
    }
}
