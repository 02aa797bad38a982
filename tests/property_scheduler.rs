// tests/property_scheduler.rs

mod common;
use crate::common::{FakeBackend, FakeResponse, RawConfigBuilder, StaticChangeSource, TaskConfigBuilder};

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use phaserun::config::ConfigFile;
use phaserun::engine::{execute_run, RunConfig, RunFlags};
use phaserun::record::RunRecord;
use phaserun::types::{GitMode, TaskStatus};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct GenTask {
    phase: usize,
    fails: bool,
    watches_docs: bool,
}

fn tasks_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<GenTask>> {
    proptest::collection::vec(
        (0usize..4, any::<bool>(), any::<bool>()).prop_map(|(phase, fails, watches_docs)| GenTask {
            phase,
            fails,
            watches_docs,
        }),
        1..=max_tasks,
    )
}

fn build(tasks: &[GenTask]) -> (ConfigFile, FakeBackend) {
    let mut builder = RawConfigBuilder::new()
        .git_mode(GitMode::Staged)
        .phases(&["p0", "p1", "p2", "p3"]);
    let mut backend = FakeBackend::new();

    for (i, t) in tasks.iter().enumerate() {
        let id = format!("task_{i}");
        let mut task = TaskConfigBuilder::new(&id, &id).phase(&format!("p{}", t.phase));
        if t.watches_docs {
            task = task.watch("docs/**");
        }
        builder = builder.with_task(task.build());
        if t.fails {
            backend = backend.script(&id, &[FakeResponse::fail()]);
        }
    }
    (builder.build(), backend)
}

fn run(tasks: &[GenTask], fail_fast: bool) -> RunRecord {
    let (config, backend) = build(tasks);
    let flags = RunFlags {
        fail_fast,
        ..RunFlags::default()
    };
    let cfg = RunConfig::new(Path::new("/repo"), config, flags);
    let source = StaticChangeSource::new(&["src/lib.rs"]);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    rt.block_on(execute_run(&cfg, &source, Arc::new(backend)))
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn without_fail_fast_every_task_appears_exactly_once(tasks in tasks_strategy(12)) {
        let record = run(&tasks, false);

        let ids: Vec<_> = record.result.outcomes.iter().map(|o| o.id.clone()).collect();
        let unique: HashSet<_> = ids.iter().cloned().collect();
        prop_assert_eq!(ids.len(), tasks.len());
        prop_assert_eq!(unique.len(), tasks.len());

        for (i, t) in tasks.iter().enumerate() {
            let outcome = record.result.outcome(&format!("task_{i}")).unwrap();
            let expected = if t.watches_docs {
                TaskStatus::Skipped
            } else if t.fails {
                TaskStatus::Fail
            } else {
                TaskStatus::Pass
            };
            prop_assert_eq!(outcome.status, expected);
        }
    }

    #[test]
    fn fail_fast_never_runs_a_phase_after_a_failure(tasks in tasks_strategy(12)) {
        let record = run(&tasks, true);

        // earliest phase holding a task that actually runs and fails
        let first_failing_phase = tasks
            .iter()
            .filter(|t| t.fails && !t.watches_docs)
            .map(|t| t.phase)
            .min();

        for (i, t) in tasks.iter().enumerate() {
            let outcome = record.result.outcome(&format!("task_{i}"));
            let ran = !t.watches_docs;
            match first_failing_phase {
                Some(p) if ran && t.phase > p => prop_assert!(outcome.is_none()),
                _ => prop_assert!(outcome.is_some()),
            }
        }

        // no duplicates either way
        let ids: HashSet<_> = record.result.outcomes.iter().map(|o| o.id.clone()).collect();
        prop_assert_eq!(ids.len(), record.result.outcomes.len());
    }
}
