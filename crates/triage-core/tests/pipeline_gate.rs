use std::sync::Arc;
use triage_core::collect::SuiteRunner;
use triage_core::engine::Pipeline;
use triage_core::flaky::FlakyPolicy;
use triage_core::model::{Classification, Engine, TriageAction};
use triage_core::resolver::TriageResolver;
use triage_core::storage::Store;

struct FakeRunner {
    collect: anyhow::Result<(i32, String)>,
    execute: (i32, String),
}

impl FakeRunner {
    fn new(collected: &str, code: i32, output: &str) -> Self {
        Self {
            collect: Ok((0, collected.to_string())),
            execute: (code, output.to_string()),
        }
    }

    fn broken_discovery(code: i32, output: &str) -> Self {
        Self {
            collect: Err(anyhow::anyhow!("pytest: command not found")),
            execute: (code, output.to_string()),
        }
    }
}

impl SuiteRunner for FakeRunner {
    fn collect(&self) -> anyhow::Result<(i32, String)> {
        match &self.collect {
            Ok(v) => Ok(v.clone()),
            Err(e) => Err(anyhow::anyhow!("{}", e)),
        }
    }

    fn execute(&self) -> anyhow::Result<(i32, String)> {
        Ok(self.execute.clone())
    }
}

fn pipeline(store: &Store, runner: FakeRunner) -> Pipeline {
    Pipeline {
        store: store.clone(),
        runner: Arc::new(runner),
        resolver: TriageResolver::rules_only(),
        flaky: FlakyPolicy::default(),
    }
}

const FLAKY_ID: &str = "app/test_flaky.py::test_sometimes";
const COLLECTED: &str = "app/test_flaky.py::test_sometimes\napp/test_ok.py::test_always\n";

#[tokio::test]
async fn ok_run_passes_the_gate() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;

    let report = pipeline(&store, FakeRunner::new(COLLECTED, 0, "2 passed in 0.01s\n"))
        .run_once()
        .await?;

    assert!(report.ok);
    assert!(!report.block_ci);
    assert!(report.failed_tests.is_empty());
    assert!(report.flaky_failed_tests.is_empty());
    assert_eq!(report.triage.classification, Classification::Unknown);
    assert_eq!(report.triage.action, TriageAction::Ignore);
    assert_eq!(report.triage.confidence, 1.0);
    assert_eq!(report.triage.engine, None);

    let run = store.get_run(report.run_id)?.expect("persisted");
    assert!(run.ok);
    assert_eq!(run.triage, report.triage);
    assert_eq!(run.all_tests.len(), 2);
    Ok(())
}

#[tokio::test]
async fn code_bug_failure_blocks_the_gate() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;

    let output = "FAILED app/test_flaky.py::test_sometimes - ZeroDivisionError: division by zero\n";
    let report = pipeline(&store, FakeRunner::new(COLLECTED, 1, output))
        .run_once()
        .await?;

    assert!(!report.ok);
    assert!(report.block_ci);
    assert_eq!(report.failed_tests, vec![FLAKY_ID.to_string()]);
    assert_eq!(report.triage.classification, Classification::CodeBug);
    assert_eq!(report.triage.engine, Some(Engine::Rules));
    assert!(report.triage.engine_error.is_some());

    let run = store.get_run(report.run_id)?.expect("persisted");
    assert_eq!(run.failed_tests, report.failed_tests);
    assert!(run.failed_tests.iter().all(|t| run.all_tests.contains(t)));
    Ok(())
}

#[tokio::test]
async fn flaky_annotation_does_not_override_the_gate() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;

    let fail_output =
        "FAILED app/test_flaky.py::test_sometimes - ZeroDivisionError: division by zero\n";

    let r1 = pipeline(&store, FakeRunner::new(COLLECTED, 1, fail_output))
        .run_once()
        .await?;
    // Too little history yet: not annotated.
    assert!(r1.flaky_failed_tests.is_empty());

    pipeline(&store, FakeRunner::new(COLLECTED, 0, "2 passed\n"))
        .run_once()
        .await?;

    let r3 = pipeline(&store, FakeRunner::new(COLLECTED, 1, fail_output))
        .run_once()
        .await?;

    // Three observations, both outcomes seen: annotated as flaky, but
    // the decision still gates the build.
    assert_eq!(r3.flaky_failed_tests, vec![FLAKY_ID.to_string()]);
    assert!(r3.block_ci);
    Ok(())
}

#[tokio::test]
async fn environment_failure_does_not_block() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;

    let output = "FAILED app/test_ok.py::test_always - ConnectionError: registry unreachable\n";
    let report = pipeline(&store, FakeRunner::new(COLLECTED, 1, output))
        .run_once()
        .await?;

    assert!(!report.ok);
    assert!(!report.block_ci);
    assert_eq!(report.triage.classification, Classification::EnvironmentIssue);
    assert_eq!(report.triage.action, TriageAction::Retry);
    Ok(())
}

#[tokio::test]
async fn broken_discovery_degrades_to_empty_universe() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;

    let output = "FAILED app/test_flaky.py::test_sometimes - AssertionError\n";
    let report = pipeline(&store, FakeRunner::broken_discovery(1, output))
        .run_once()
        .await?;

    // The run is still recorded; the failure signal survives alone.
    let run = store.get_run(report.run_id)?.expect("persisted");
    assert!(run.all_tests.is_empty());
    assert_eq!(run.failed_tests, vec![FLAKY_ID.to_string()]);
    assert!(report.block_ci);
    Ok(())
}
