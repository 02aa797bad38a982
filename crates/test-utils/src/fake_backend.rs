use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use phaserun::exec::{CommandBackend, CommandExit, CommandInvocation, CommandResult, InvocationKind};

/// What the fake reports for one invocation of a command.
#[derive(Debug, Clone, Copy)]
pub struct FakeResponse {
    pub exit: CommandExit,
    pub delay: Duration,
}

impl FakeResponse {
    pub fn exit(code: i32) -> Self {
        Self {
            exit: CommandExit::Exited(code),
            delay: Duration::ZERO,
        }
    }

    pub fn pass() -> Self {
        Self::exit(0)
    }

    pub fn fail() -> Self {
        Self::exit(1)
    }

    pub fn timed_out() -> Self {
        Self {
            exit: CommandExit::TimedOut,
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One invocation seen by the fake.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub task_id: String,
    pub kind: InvocationKind,
    pub command: String,
    pub workdir: PathBuf,
    pub env: std::collections::BTreeMap<String, String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// A scripted backend that:
/// - answers each command from a per-command queue of responses (the last
///   response repeats; unscripted commands pass immediately)
/// - records every invocation with its timestamps
/// - tracks the peak number of concurrently running commands
#[derive(Debug, Default)]
pub struct FakeBackend {
    scripts: Mutex<HashMap<String, VecDeque<FakeResponse>>>,
    calls: Mutex<Vec<RecordedCall>>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue responses for `command`, in order.
    pub fn script(self, command: &str, responses: &[FakeResponse]) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(command.to_string(), responses.iter().copied().collect());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.command).collect()
    }

    pub fn calls_for(&self, task_id: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.task_id == task_id)
            .collect()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn next_response(&self, command: &str) -> FakeResponse {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(command) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(FakeResponse::pass),
            Some(queue) => queue.front().copied().unwrap_or_else(FakeResponse::pass),
            None => FakeResponse::pass(),
        }
    }
}

impl CommandBackend for FakeBackend {
    fn run_command<'a>(
        &'a self,
        invocation: &'a CommandInvocation,
    ) -> Pin<Box<dyn Future<Output = CommandResult> + Send + 'a>> {
        Box::pin(async move {
            let response = self.next_response(&invocation.command);

            let now_running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now_running, Ordering::SeqCst);

            let started_at = Utc::now();
            let start = Instant::now();
            if !response.delay.is_zero() {
                tokio::time::sleep(response.delay).await;
            }
            let finished_at = Utc::now();
            self.running.fetch_sub(1, Ordering::SeqCst);

            self.calls.lock().unwrap().push(RecordedCall {
                task_id: invocation.task_id.clone(),
                kind: invocation.kind,
                command: invocation.command.clone(),
                workdir: invocation.workdir.clone(),
                env: invocation.env.clone(),
                started_at,
                finished_at,
            });

            let message = match response.exit {
                CommandExit::Exited(0) => None,
                CommandExit::Exited(code) => Some(format!("exited with code {code}")),
                CommandExit::TimedOut => Some("timeout after fake deadline".to_string()),
                other => Some(format!("{other:?}")),
            };

            CommandResult {
                exit: response.exit,
                message,
                started_at,
                finished_at,
                duration: start.elapsed(),
            }
        })
    }
}
