// tests/end_to_end_shell.rs
#![cfg(unix)]

mod common;
use crate::common::{
    init_tracing, run_config, with_timeout, write_file, RawConfigBuilder, StaticChangeSource,
    TaskConfigBuilder,
};

use std::error::Error;
use std::sync::Arc;

use phaserun::engine::{execute_run, RunFlags};
use phaserun::exec::ProcessBackend;
use phaserun::metrics::MetricsSummary;
use phaserun::types::{FixType, OutputFormat, RunStatus, TaskStatus};
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn auto_fix_repairs_a_failing_check() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let config = RawConfigBuilder::new()
        .with_task(
            TaskConfigBuilder::new("fmt", "test -f formatted")
                .fix(FixType::Auto, "touch formatted")
                .build(),
        )
        .build();
    let cfg = run_config(dir.path(), config, RunFlags::default());

    let record = with_timeout(execute_run(
        &cfg,
        &StaticChangeSource::new(&[]),
        Arc::new(ProcessBackend::new()),
    ))
    .await?;

    let fmt = record.result.outcome("fmt").ok_or("fmt missing")?;
    assert_eq!(fmt.status, TaskStatus::Pass);
    assert!(fmt.auto_fixed);
    assert_eq!(fmt.initial_exit_code, Some(1));
    assert_eq!(fmt.exit_code, Some(0));
    assert_eq!(record.result.status, RunStatus::Pass);

    let log_path = fmt.log_path.as_ref().ok_or("log path missing")?;
    assert_eq!(
        *log_path,
        cfg.log_dir(&record.run_id).join("fmt.log")
    );
    let log = std::fs::read_to_string(log_path)?;
    assert!(log.contains("touch formatted"));
    Ok(())
}

#[tokio::test]
async fn metrics_are_attached_from_declared_outputs() -> TestResult {
    let dir = tempdir()?;
    std::fs::create_dir_all(dir.path().join("web"))?;
    let junit = r#"<testsuites><testsuite name="s" tests="4" failures="1" errors="0" skipped="1"></testsuite></testsuites>"#;
    write_file(dir.path(), "fixtures/junit.xml", junit);

    let config = RawConfigBuilder::new()
        .with_task(
            TaskConfigBuilder::new("unit", "mkdir -p out && cp ../fixtures/junit.xml out/junit.xml; exit 1")
                .workdir("web")
                .output(OutputFormat::Junit, "out/junit.xml")
                .build(),
        )
        .with_task(
            TaskConfigBuilder::new("bundle", "printf 12345 > bundle.js")
                .workdir("web")
                .output(OutputFormat::Artifact, "bundle.js")
                .build(),
        )
        .with_task(
            TaskConfigBuilder::new("scan", "true")
                .output(OutputFormat::Sarif, "missing.sarif")
                .build(),
        )
        .build();
    let cfg = run_config(dir.path(), config, RunFlags::default());

    let record = execute_run(
        &cfg,
        &StaticChangeSource::new(&[]),
        Arc::new(ProcessBackend::new()),
    )
    .await?;

    let unit = record.result.outcome("unit").ok_or("unit missing")?;
    // metrics never change the status
    assert_eq!(unit.status, TaskStatus::Fail);
    match &unit.metrics {
        Some(MetricsSummary::Junit(s)) => {
            assert_eq!((s.tests, s.failures, s.errors, s.skipped), (4, 1, 0, 1));
        }
        other => panic!("expected junit metrics, got {other:?}"),
    }

    let bundle = record.result.outcome("bundle").ok_or("bundle missing")?;
    match &bundle.metrics {
        Some(MetricsSummary::Artifact(a)) => {
            assert!(a.exists);
            assert_eq!(a.bytes, Some(5));
        }
        other => panic!("expected artifact metrics, got {other:?}"),
    }

    // unreadable output: summary omitted, task still passes
    let scan = record.result.outcome("scan").ok_or("scan missing")?;
    assert_eq!(scan.status, TaskStatus::Pass);
    assert!(scan.metrics.is_none());
    Ok(())
}

#[tokio::test]
async fn one_failing_task_does_not_disturb_its_siblings() -> TestResult {
    let dir = tempdir()?;
    let config = RawConfigBuilder::new()
        .with_task(TaskConfigBuilder::new("missing", "no-such-binary-phaserun").build())
        .with_task(TaskConfigBuilder::new("slow", "sleep 5").timeout(1).build())
        .with_task(TaskConfigBuilder::new("fine", "echo fine").build())
        .build();
    let cfg = run_config(dir.path(), config, RunFlags::default());

    let record = with_timeout(execute_run(
        &cfg,
        &StaticChangeSource::new(&[]),
        Arc::new(ProcessBackend::new()),
    ))
    .await?;

    let missing = record.result.outcome("missing").ok_or("missing")?;
    assert_eq!(missing.status, TaskStatus::Fail);
    assert_eq!(
        missing.message.as_deref(),
        Some("command not found: no-such-binary-phaserun")
    );

    let slow = record.result.outcome("slow").ok_or("slow")?;
    assert_eq!(slow.status, TaskStatus::Fail);
    assert_eq!(slow.exit_code, None);
    assert!(slow.message.as_deref().is_some_and(|m| m.starts_with("timeout after")));

    let fine = record.result.outcome("fine").ok_or("fine")?;
    assert_eq!(fine.status, TaskStatus::Pass);
    assert_eq!(record.result.status, RunStatus::Fail);
    Ok(())
}
