// tests/executor_process.rs
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;
use std::time::{Duration, Instant};

use phaserun::exec::{CommandExit, CommandInvocation, InvocationKind, ProcessBackend, CommandBackend};
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn Error>>;

fn invocation(dir: &Path, command: &str) -> CommandInvocation {
    CommandInvocation {
        task_id: "t".to_string(),
        kind: InvocationKind::Check,
        command: command.to_string(),
        workdir: dir.to_path_buf(),
        env: BTreeMap::new(),
        timeout: None,
        log_path: dir.join("logs/t.log"),
    }
}

#[tokio::test]
async fn zero_exit_passes_and_output_goes_to_log() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let inv = invocation(dir.path(), "echo hello-from-task; echo oops 1>&2");

    let result = ProcessBackend::new().run_command(&inv).await;

    assert!(result.passed());
    assert_eq!(result.exit_code(), Some(0));
    assert!(result.message.is_none());
    assert!(result.finished_at >= result.started_at);

    let log = std::fs::read_to_string(&inv.log_path)?;
    assert!(log.contains("hello-from-task"));
    assert!(log.contains("oops"));
    Ok(())
}

#[tokio::test]
async fn nonzero_exit_is_classified() -> TestResult {
    let dir = tempdir()?;
    let result = ProcessBackend::new()
        .run_command(&invocation(dir.path(), "exit 3"))
        .await;

    assert!(!result.passed());
    assert_eq!(result.exit, CommandExit::Exited(3));
    assert_eq!(result.message.as_deref(), Some("exited with code 3"));
    Ok(())
}

#[tokio::test]
async fn timeout_kills_the_process_tree() -> TestResult {
    let dir = tempdir()?;
    let marker = dir.path().join("survived");
    // the background child would create the marker if it outlived the kill
    let command = format!("(sleep 2; touch {}) & sleep 30", marker.display());
    let mut inv = invocation(dir.path(), &command);
    inv.timeout = Some(Duration::from_millis(300));

    let started = Instant::now();
    let result = with_timeout(ProcessBackend::new().run_command(&inv)).await;

    assert_eq!(result.exit, CommandExit::TimedOut);
    assert_eq!(result.exit_code(), None);
    assert!(result
        .message
        .as_deref()
        .is_some_and(|m| m.starts_with("timeout after")));
    assert!(started.elapsed() < Duration::from_secs(10));

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(!marker.exists(), "grandchild outlived the timeout kill");
    Ok(())
}

#[tokio::test]
async fn timeout_keeps_output_written_before_the_kill() -> TestResult {
    let dir = tempdir()?;
    let mut inv = invocation(dir.path(), "echo early; sleep 30");
    inv.timeout = Some(Duration::from_millis(300));

    let result = with_timeout(ProcessBackend::new().run_command(&inv)).await;
    assert_eq!(result.exit, CommandExit::TimedOut);

    let log = std::fs::read_to_string(&inv.log_path)?;
    assert!(log.contains("early"), "partial output lost: {log:?}");
    Ok(())
}

#[tokio::test]
async fn path_assignment_prefix_resolves_program_from_that_path() -> TestResult {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir()?;
    let bin = dir.path().join("bin");
    std::fs::create_dir_all(&bin)?;
    let tool = bin.join("mytool");
    std::fs::write(&tool, "#!/bin/sh\necho from-mytool\n")?;
    std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755))?;

    let inv = invocation(dir.path(), "PATH=bin:$PATH mytool");
    let result = ProcessBackend::new().run_command(&inv).await;

    assert!(result.passed(), "{:?} {:?}", result.exit, result.message);
    let log = std::fs::read_to_string(&inv.log_path)?;
    assert!(log.contains("from-mytool"));
    Ok(())
}

#[tokio::test]
async fn missing_program_behind_path_assignment_is_still_classified() -> TestResult {
    let dir = tempdir()?;
    let result = ProcessBackend::new()
        .run_command(&invocation(dir.path(), "PATH=bin:$PATH definitely-not-a-real-program-xyz"))
        .await;

    assert!(!result.passed());
    assert!(result
        .message
        .as_deref()
        .is_some_and(|m| m.contains("not found")));
    Ok(())
}

#[tokio::test]
async fn missing_program_is_command_not_found() -> TestResult {
    let dir = tempdir()?;
    let result = ProcessBackend::new()
        .run_command(&invocation(dir.path(), "definitely-not-a-real-program-xyz --flag"))
        .await;

    assert_eq!(result.exit, CommandExit::CommandNotFound);
    assert_eq!(
        result.message.as_deref(),
        Some("command not found: definitely-not-a-real-program-xyz")
    );
    Ok(())
}

#[tokio::test]
async fn missing_workdir_fails_without_spawning() -> TestResult {
    let dir = tempdir()?;
    let mut inv = invocation(dir.path(), "touch created.txt");
    inv.workdir = dir.path().join("nope");

    let result = ProcessBackend::new().run_command(&inv).await;

    assert_eq!(result.exit, CommandExit::WorkdirMissing);
    assert!(result
        .message
        .as_deref()
        .is_some_and(|m| m.starts_with("working directory does not exist")));
    assert!(!dir.path().join("created.txt").exists());
    Ok(())
}

#[tokio::test]
async fn task_env_is_overlaid_and_cwd_is_workdir() -> TestResult {
    let dir = tempdir()?;
    std::fs::create_dir_all(dir.path().join("sub"))?;

    let mut inv = invocation(dir.path(), "echo \"$GREETING\" > out.txt");
    inv.workdir = dir.path().join("sub");
    inv.env.insert("GREETING".to_string(), "bonjour".to_string());

    let result = ProcessBackend::new().run_command(&inv).await;
    assert!(result.passed(), "{:?}", result.message);

    let out = std::fs::read_to_string(dir.path().join("sub/out.txt"))?;
    assert_eq!(out.trim(), "bonjour");
    Ok(())
}

#[tokio::test]
async fn repeated_invocations_append_to_the_same_log() -> TestResult {
    let dir = tempdir()?;
    let backend = ProcessBackend::new();

    let first = invocation(dir.path(), "echo first-run");
    let mut second = invocation(dir.path(), "echo second-run");
    second.kind = InvocationKind::Recheck;

    backend.run_command(&first).await;
    backend.run_command(&second).await;

    let log = std::fs::read_to_string(&first.log_path)?;
    let a = log.find("first-run").ok_or("first run missing from log")?;
    let b = log.find("second-run").ok_or("second run missing from log")?;
    assert!(a < b);
    assert!(log.contains("recheck"));
    Ok(())
}
