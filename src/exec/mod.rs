// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the commands defined in
//! the tasks, using `tokio::process::Command`, and turning what happened into
//! task outcomes.
//!
//! - [`process`] spawns one command, streams its output to the task log and
//!   enforces the deadline.
//! - [`fix`] wraps a task's command with the auto/helper fix state machine.
//! - [`backend`] provides the `CommandBackend` trait and the concrete
//!   `ProcessBackend`, which tests can replace with a scripted fake.

pub mod backend;
pub mod fix;
pub mod process;

pub use backend::{
    CommandBackend, CommandExit, CommandInvocation, CommandResult, InvocationKind, ProcessBackend,
};
pub use fix::FixCoordinator;
