// tests/phase_scheduler.rs

mod common;
use crate::common::{init_tracing, with_timeout, FakeBackend, FakeResponse, TaskSpecBuilder};

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use phaserun::exec::FixCoordinator;
use phaserun::fs::mock::MockFileSystem;
use phaserun::metrics::{JunitSummary, MetricsSummary};
use phaserun::record::ResultRecorder;
use phaserun::schedule::{group_by_phase, PhaseScheduler, PhaseState, ScheduleOptions};
use phaserun::task::TaskSpec;
use phaserun::types::{OutputFormat, RunStatus, TaskStatus};

type TestResult = Result<(), Box<dyn Error>>;

fn scheduler(backend: Arc<FakeBackend>, options: ScheduleOptions) -> PhaseScheduler<FakeBackend> {
    let coordinator = FixCoordinator::new(backend, "/repo", "/repo/.phaserun/r/logs", false);
    PhaseScheduler::new(coordinator, "/repo", options)
}

fn order(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn three_phases() -> (Vec<TaskSpec>, Vec<String>) {
    let tasks = vec![
        TaskSpecBuilder::new("fmt", "fmt").phase("lint").build(),
        TaskSpecBuilder::new("clippy", "clippy").phase("lint").build(),
        TaskSpecBuilder::new("unit", "unit").phase("test").build(),
        TaskSpecBuilder::new("broken", "broken").phase("test").build(),
        TaskSpecBuilder::new("package", "package").phase("release").build(),
    ];
    (tasks, order(&["lint", "test", "release"]))
}

fn failing_backend() -> FakeBackend {
    FakeBackend::new()
        .script("broken", &[FakeResponse::fail()])
        .script("unit", &[FakeResponse::pass().after(Duration::from_millis(50))])
}

#[tokio::test]
async fn fail_fast_stops_before_the_next_phase() -> TestResult {
    init_tracing();
    let backend = Arc::new(failing_backend());
    let (tasks, order) = three_phases();
    let recorder = ResultRecorder::new();

    let reports = with_timeout(
        scheduler(
            Arc::clone(&backend),
            ScheduleOptions {
                fail_fast: true,
                max_parallel: None,
            },
        )
        .run(group_by_phase(tasks, &order), &recorder),
    )
    .await;

    let result = recorder.finish();
    assert_eq!(result.status, RunStatus::Fail);
    assert_eq!(result.outcome("fmt").map(|o| o.status), Some(TaskStatus::Pass));
    assert_eq!(result.outcome("broken").map(|o| o.status), Some(TaskStatus::Fail));
    // the slower sibling is never cancelled
    assert_eq!(result.outcome("unit").map(|o| o.status), Some(TaskStatus::Pass));
    // never attempted, so no outcome at all
    assert!(result.outcome("package").is_none());
    assert_eq!(result.outcomes.len(), 4);

    assert!(!backend.commands().contains(&"package".to_string()));
    let states: Vec<_> = reports.iter().map(|r| r.state).collect();
    assert_eq!(
        states,
        vec![PhaseState::Completed, PhaseState::Completed, PhaseState::NotStarted]
    );
    Ok(())
}

#[tokio::test]
async fn without_fail_fast_every_phase_runs() -> TestResult {
    let backend = Arc::new(failing_backend());
    let (tasks, order) = three_phases();
    let recorder = ResultRecorder::new();

    scheduler(Arc::clone(&backend), ScheduleOptions::default())
        .run(group_by_phase(tasks, &order), &recorder)
        .await;

    let result = recorder.finish();
    assert_eq!(result.status, RunStatus::Fail);
    assert_eq!(result.outcomes.len(), 5);
    assert_eq!(
        result.outcome("package").map(|o| o.status),
        Some(TaskStatus::Pass)
    );
    Ok(())
}

#[tokio::test]
async fn phase_barrier_is_total() -> TestResult {
    let backend = Arc::new(
        FakeBackend::new()
            .script("a1", &[FakeResponse::pass().after(Duration::from_millis(80))])
            .script("a2", &[FakeResponse::pass().after(Duration::from_millis(10))]),
    );
    let tasks = vec![
        TaskSpecBuilder::new("a1", "a1").phase("one").build(),
        TaskSpecBuilder::new("a2", "a2").phase("one").build(),
        TaskSpecBuilder::new("b1", "b1").phase("two").build(),
        TaskSpecBuilder::new("b2", "b2").phase("two").build(),
    ];
    let recorder = ResultRecorder::new();

    scheduler(Arc::clone(&backend), ScheduleOptions::default())
        .run(group_by_phase(tasks, &order(&["one", "two"])), &recorder)
        .await;

    let calls = backend.calls();
    let last_end_of_one = calls
        .iter()
        .filter(|c| c.task_id.starts_with('a'))
        .map(|c| c.finished_at)
        .max()
        .ok_or("phase one never ran")?;
    for call in calls.iter().filter(|c| c.task_id.starts_with('b')) {
        assert!(call.started_at >= last_end_of_one, "{} started early", call.task_id);
    }

    // within a phase the record follows completion order: a2 finishes first
    let ids: Vec<_> = recorder.finish().outcomes.into_iter().map(|o| o.id).collect();
    assert_eq!(&ids[..2], &["a2".to_string(), "a1".to_string()]);
    Ok(())
}

#[tokio::test]
async fn tasks_in_a_phase_run_concurrently() -> TestResult {
    let mut builder = FakeBackend::new();
    let mut tasks = Vec::new();
    for i in 0..6 {
        let id = format!("t{i}");
        builder = builder.script(&id, &[FakeResponse::pass().after(Duration::from_millis(100))]);
        tasks.push(TaskSpecBuilder::new(&id, &id).build());
    }
    let backend = Arc::new(builder);
    let recorder = ResultRecorder::new();

    with_timeout(
        scheduler(Arc::clone(&backend), ScheduleOptions::default())
            .run(group_by_phase(tasks, &order(&["default"])), &recorder),
    )
    .await;

    assert_eq!(backend.peak_concurrency(), 6);
    assert_eq!(recorder.len(), 6);
    Ok(())
}

#[tokio::test]
async fn max_parallel_caps_concurrency() -> TestResult {
    let mut builder = FakeBackend::new();
    let mut tasks = Vec::new();
    for i in 0..5 {
        let id = format!("t{i}");
        builder = builder.script(&id, &[FakeResponse::pass().after(Duration::from_millis(40))]);
        tasks.push(TaskSpecBuilder::new(&id, &id).build());
    }
    let backend = Arc::new(builder);
    let recorder = ResultRecorder::new();

    scheduler(
        Arc::clone(&backend),
        ScheduleOptions {
            fail_fast: false,
            max_parallel: Some(2),
        },
    )
    .run(group_by_phase(tasks, &order(&["default"])), &recorder)
    .await;

    assert!(backend.peak_concurrency() <= 2);
    assert_eq!(recorder.len(), 5);
    Ok(())
}

#[tokio::test]
async fn wait_marker_orders_tasks_within_a_phase() -> TestResult {
    let backend = Arc::new(
        FakeBackend::new().script("gen", &[FakeResponse::pass().after(Duration::from_millis(60))]),
    );
    let tasks = vec![
        TaskSpecBuilder::new("gen", "gen").build(),
        TaskSpecBuilder::wait_marker("barrier").build(),
        TaskSpecBuilder::new("use", "use").build(),
    ];
    let recorder = ResultRecorder::new();

    scheduler(Arc::clone(&backend), ScheduleOptions::default())
        .run(group_by_phase(tasks, &order(&["default"])), &recorder)
        .await;

    let calls = backend.calls();
    let gen_end = calls
        .iter()
        .find(|c| c.task_id == "gen")
        .map(|c| c.finished_at)
        .ok_or("gen missing")?;
    let use_start = calls
        .iter()
        .find(|c| c.task_id == "use")
        .map(|c| c.started_at)
        .ok_or("use missing")?;
    assert!(use_start >= gen_end);

    let result = recorder.finish();
    assert_eq!(
        result.outcome("barrier").map(|o| o.status),
        Some(TaskStatus::Pass)
    );
    assert_eq!(result.outcomes.len(), 3);
    Ok(())
}

#[tokio::test]
async fn fail_fast_also_gates_wait_segments() -> TestResult {
    let backend = Arc::new(FakeBackend::new().script("bad", &[FakeResponse::fail()]));
    let tasks = vec![
        TaskSpecBuilder::new("bad", "bad").build(),
        TaskSpecBuilder::wait_marker("barrier").build(),
        TaskSpecBuilder::new("after", "after").build(),
    ];
    let recorder = ResultRecorder::new();

    let reports = scheduler(
        Arc::clone(&backend),
        ScheduleOptions {
            fail_fast: true,
            max_parallel: None,
        },
    )
    .run(group_by_phase(tasks, &order(&["default"])), &recorder)
    .await;

    let result = recorder.finish();
    assert_eq!(result.outcomes.len(), 1);
    assert!(result.outcome("after").is_none());
    assert_eq!(reports[0].state, PhaseState::Running);
    Ok(())
}

#[tokio::test]
async fn empty_phases_complete_immediately() -> TestResult {
    let backend = Arc::new(FakeBackend::new());
    let tasks = vec![TaskSpecBuilder::new("only", "only").phase("late").build()];
    let recorder = ResultRecorder::new();

    let reports = scheduler(Arc::clone(&backend), ScheduleOptions::default())
        .run(group_by_phase(tasks, &order(&["early", "late"])), &recorder)
        .await;

    assert_eq!(reports[0].tasks, 0);
    assert_eq!(reports[0].state, PhaseState::Completed);
    assert_eq!(reports[1].state, PhaseState::Completed);
    assert_eq!(recorder.len(), 1);
    Ok(())
}

#[tokio::test]
async fn metrics_are_read_through_the_injected_file_system() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/repo/app/reports/junit.xml",
        r#"<testsuite name="s" tests="4" failures="1" errors="0" skipped="0"></testsuite>"#,
    );

    let backend = Arc::new(FakeBackend::new().script("unit", &[FakeResponse::fail()]));
    let tasks = vec![
        TaskSpecBuilder::new("unit", "unit")
            .workdir("app")
            .output(OutputFormat::Junit, "reports/junit.xml")
            .build(),
        TaskSpecBuilder::new("bundle", "bundle")
            .workdir("app")
            .output(OutputFormat::Junit, "reports/missing.xml")
            .build(),
    ];
    let recorder = ResultRecorder::new();

    scheduler(backend, ScheduleOptions::default())
        .with_file_system(Arc::new(fs))
        .run(group_by_phase(tasks, &order(&["default"])), &recorder)
        .await;

    let result = recorder.finish();
    let unit = result.outcome("unit").ok_or("unit outcome missing")?;
    assert_eq!(unit.status, TaskStatus::Fail);
    assert_eq!(
        unit.metrics,
        Some(MetricsSummary::Junit(JunitSummary {
            tests: 4,
            failures: 1,
            errors: 0,
            skipped: 0,
        }))
    );
    // unreadable output omits the summary without touching the status
    let bundle = result.outcome("bundle").ok_or("bundle outcome missing")?;
    assert_eq!(bundle.status, TaskStatus::Pass);
    assert!(bundle.metrics.is_none());
    Ok(())
}
