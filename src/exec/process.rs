// src/exec/process.rs

//! Individual command process runner.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::backend::{CommandExit, CommandInvocation, CommandResult};

/// Exit code POSIX shells use for "command not found".
const SHELL_NOT_FOUND: i32 = 127;

/// Words the shell resolves itself; they never live on `PATH`.
const SHELL_BUILTINS: &[&str] = &[
    ".", ":", "[", "alias", "break", "cd", "command", "continue", "echo", "eval", "exec", "exit",
    "export", "false", "getopts", "hash", "printf", "pwd", "read", "readonly", "return", "set",
    "shift", "source", "test", "times", "trap", "true", "type", "ulimit", "umask", "unalias",
    "unset", "wait", "if", "for", "while", "until", "case", "!",
];

/// Run one command to completion (or deadline), streaming its combined
/// stdout/stderr into the invocation's log file.
///
/// Never fails: every problem is folded into a [`CommandResult`] with a
/// classified message so that sibling tasks and the run are unaffected.
pub async fn run_command(inv: &CommandInvocation) -> CommandResult {
    let started_at = Utc::now();
    let clock = Instant::now();

    let finish = |exit: CommandExit, message: Option<String>| CommandResult {
        exit,
        message,
        started_at,
        finished_at: Utc::now(),
        duration: clock.elapsed(),
    };

    if !inv.workdir.is_dir() {
        let msg = format!(
            "working directory does not exist: {}",
            inv.workdir.display()
        );
        warn!(task = %inv.task_id, kind = %inv.kind, "{msg}");
        append_note(&inv.log_path, &msg);
        return finish(CommandExit::WorkdirMissing, Some(msg));
    }

    if let Some(program) = leading_program(&inv.command) {
        if !program_exists(program, &inv.workdir, inv.env.get("PATH").map(String::as_str)) {
            let msg = format!("command not found: {program}");
            warn!(task = %inv.task_id, kind = %inv.kind, "{msg}");
            append_note(&inv.log_path, &msg);
            return finish(CommandExit::CommandNotFound, Some(msg));
        }
    }

    let log = match open_log(&inv.log_path) {
        Ok(log) => log,
        Err(err) => {
            let msg = format!("failed to open log file: {err:#}");
            warn!(task = %inv.task_id, kind = %inv.kind, "{msg}");
            return finish(CommandExit::SpawnFailed, Some(msg));
        }
    };

    let _ = writeln!(
        &log,
        "==> [{}] {} ({})",
        inv.kind,
        inv.command,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    let mut child = match spawn(inv, &log) {
        Ok(child) => child,
        Err(err) => {
            let not_found = err
                .downcast_ref::<std::io::Error>()
                .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound);
            let (exit, msg) = if not_found {
                (CommandExit::CommandNotFound, format!("command not found: {err:#}"))
            } else {
                (CommandExit::SpawnFailed, format!("failed to spawn process: {err:#}"))
            };
            warn!(task = %inv.task_id, kind = %inv.kind, "{msg}");
            append_note(&inv.log_path, &msg);
            return finish(exit, Some(msg));
        }
    };

    info!(
        task = %inv.task_id,
        kind = %inv.kind,
        pid = child.id(),
        cmd = %inv.command,
        "started process"
    );

    let waited = match inv.timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => Some(status),
            Err(_) => None,
        },
        None => Some(child.wait().await),
    };

    let result = match waited {
        Some(Ok(status)) => {
            let (exit, message) = classify_status(status, &inv.command);
            finish(exit, message)
        }
        Some(Err(err)) => finish(
            CommandExit::SpawnFailed,
            Some(format!("failed waiting for process: {err}")),
        ),
        None => {
            kill_process_tree(&mut child, inv).await;
            let limit = inv.timeout.unwrap_or_default();
            finish(
                CommandExit::TimedOut,
                Some(format!("timeout after {}", format_secs(limit))),
            )
        }
    };

    append_footer(&inv.log_path, &result);

    info!(
        task = %inv.task_id,
        kind = %inv.kind,
        exit_code = result.exit_code(),
        success = result.passed(),
        duration_ms = result.duration.as_millis() as u64,
        "process finished"
    );

    result
}

fn spawn(inv: &CommandInvocation, log: &File) -> Result<Child> {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&inv.command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&inv.command);
        c
    };

    // Child writes straight into the log file, so output is on disk as it is
    // produced and survives a kill.
    let stdout = log.try_clone().context("duplicating log handle for stdout")?;
    let stderr = log.try_clone().context("duplicating log handle for stderr")?;

    cmd.current_dir(&inv.workdir)
        .envs(&inv.env)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .kill_on_drop(true);

    // Own process group, so a timeout can take down grandchildren too.
    #[cfg(unix)]
    {
        cmd.process_group(0);
    }

    cmd.spawn()
        .with_context(|| format!("spawning process for task '{}'", inv.task_id))
}

fn classify_status(status: ExitStatus, command: &str) -> (CommandExit, Option<String>) {
    match status.code() {
        Some(0) => (CommandExit::Exited(0), None),
        Some(SHELL_NOT_FOUND) => {
            let program = leading_program(command).unwrap_or(command);
            (
                CommandExit::Exited(SHELL_NOT_FOUND),
                Some(format!("command not found: {program}")),
            )
        }
        Some(code) => (
            CommandExit::Exited(code),
            Some(format!("exited with code {code}")),
        ),
        None => (CommandExit::Killed, Some(describe_signal(status))),
    }
}

#[cfg(unix)]
fn describe_signal(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(sig) => format!("terminated by signal {sig}"),
        None => "terminated without exit code".to_string(),
    }
}

#[cfg(not(unix))]
fn describe_signal(_status: ExitStatus) -> String {
    "terminated without exit code".to_string()
}

/// Kill the child and everything in its process group, then reap it.
async fn kill_process_tree(child: &mut Child, inv: &CommandInvocation) {
    warn!(
        task = %inv.task_id,
        kind = %inv.kind,
        timeout = ?inv.timeout,
        "deadline elapsed; killing process tree"
    );

    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // Negative pid addresses the process group created in `spawn`.
            let rc = unsafe { libc::kill(-(pid as libc::pid_t), libc::SIGKILL) };
            if rc != 0 {
                debug!(
                    task = %inv.task_id,
                    error = %std::io::Error::last_os_error(),
                    "killpg failed; falling back to killing the child only"
                );
            }
        }
    }

    if let Err(e) = child.kill().await {
        debug!(task = %inv.task_id, error = %e, "child already gone after group kill");
    }
}

/// First word of a simple command, if it names a program worth looking up.
///
/// Returns `None` for builtins and for anything using shell syntax the
/// lookup cannot reason about (quotes, expansions, subshells, ...). A leading
/// `PATH=` assignment also disables the lookup; exit 127 still classifies a
/// missing program after the fact.
pub(crate) fn leading_program(command: &str) -> Option<&str> {
    for token in command.split_whitespace() {
        if let Some(name) = env_assignment_name(token) {
            if name == "PATH" {
                return None;
            }
            continue;
        }
        if token.contains(|c: char| "'\"$`\\(){};&|<>*?[]~#".contains(c)) {
            return None;
        }
        if SHELL_BUILTINS.contains(&token) {
            return None;
        }
        return Some(token);
    }
    None
}

fn env_assignment_name(token: &str) -> Option<&str> {
    let (name, _) = token.split_once('=')?;
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some(name)
}

/// Whether `program` resolves to an executable, either as a path (relative
/// to `workdir`) or through `PATH`.
pub(crate) fn program_exists(program: &str, workdir: &Path, path_override: Option<&str>) -> bool {
    if cfg!(windows) {
        // PATHEXT resolution is cmd.exe's business.
        return true;
    }

    if program.contains('/') {
        return is_executable(&workdir.join(program));
    }

    let search = match path_override {
        Some(p) => Some(std::ffi::OsString::from(p)),
        None => std::env::var_os("PATH"),
    };

    let Some(search) = search else {
        return false;
    };

    std::env::split_paths(&search).any(|dir| {
        let dir = if dir.is_relative() { workdir.join(dir) } else { dir };
        is_executable(&dir.join(program))
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn open_log(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {:?}", path))?;
    Ok(file)
}

fn append_note(path: &Path, note: &str) {
    if let Ok(mut file) = open_log(path) {
        let _ = writeln!(file, "phaserun: {note}");
    }
}

fn append_footer(path: &Path, result: &CommandResult) {
    let Ok(mut file) = OpenOptions::new().append(true).open(path) else {
        return;
    };
    let status = match (result.exit_code(), &result.message) {
        (Some(code), _) => format!("exit code {code}"),
        (None, Some(msg)) => msg.clone(),
        (None, None) => "finished".to_string(),
    };
    let _ = writeln!(
        file,
        "==> {status} ({})",
        format_secs(result.duration)
    );
}

fn format_secs(d: Duration) -> String {
    format!("{:.2}s", d.as_secs_f64())
}
