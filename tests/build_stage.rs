// tests/build_stage.rs

mod common;
use crate::common::{init_tracing, with_timeout, wait_until, FakeBackend, FakeEvent, FakeScript, BUILD};

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use tbuild::engine::{shutdown_channel, BuildOutcome, BuildStage, BuildState};
use tbuild::exec::CommandSpec;

type TestResult = Result<(), Box<dyn Error>>;

fn stage(backend: &FakeBackend) -> BuildStage {
    BuildStage::new(
        &CommandSpec::new(BUILD, ["build", "./cmd/server"]),
        Path::new(".built"),
        Arc::new(backend.clone()),
    )
}

#[test]
fn output_flag_is_appended_to_build_command() {
    let backend = FakeBackend::new();
    let stage = stage(&backend);
    assert_eq!(stage.command().program, "go");
    assert_eq!(
        stage.command().args,
        vec!["build", "./cmd/server", "-o", ".built"]
    );
}

#[tokio::test]
async fn exit_zero_is_success() -> TestResult {
    init_tracing();
    let backend = FakeBackend::new();
    backend.script(BUILD, FakeScript::exits(0));
    let (_trigger, shutdown) = shutdown_channel();

    let outcome = with_timeout(stage(&backend).run_cycle(&shutdown)).await;

    assert_eq!(outcome, BuildOutcome::Succeeded);
    assert_eq!(
        backend.spawned_args(BUILD),
        vec![vec!["build", "./cmd/server", "-o", ".built"]]
    );
    Ok(())
}

#[tokio::test]
async fn nonzero_exit_is_failure_with_code() -> TestResult {
    init_tracing();
    let backend = FakeBackend::new();
    backend.script(BUILD, FakeScript::exits(2));
    let (_trigger, shutdown) = shutdown_channel();

    let outcome = with_timeout(stage(&backend).run_cycle(&shutdown)).await;

    assert_eq!(outcome, BuildOutcome::Failed(2));
    Ok(())
}

#[tokio::test]
async fn spawn_failure_is_reported_not_raised() -> TestResult {
    init_tracing();
    let backend = FakeBackend::new();
    backend.script(BUILD, FakeScript::spawn_fails());
    let (_trigger, shutdown) = shutdown_channel();

    let outcome = with_timeout(stage(&backend).run_cycle(&shutdown)).await;

    assert_eq!(outcome, BuildOutcome::SpawnFailed);
    assert!(backend.events().is_empty());
    Ok(())
}

#[tokio::test]
async fn shutdown_kills_a_build_in_progress() -> TestResult {
    init_tracing();
    let backend = FakeBackend::new();
    backend.script(BUILD, FakeScript::long_running());
    let (trigger, shutdown) = shutdown_channel();

    let stage = Arc::new(stage(&backend));
    let task = {
        let stage = Arc::clone(&stage);
        tokio::spawn(async move { stage.run_cycle(&shutdown).await })
    };

    wait_until("build spawned", || backend.spawn_count(BUILD) == 1).await;
    assert_eq!(stage.state(), BuildState::Building);

    trigger.trigger();
    let outcome = with_timeout(task).await?;

    assert_eq!(outcome, BuildOutcome::Cancelled);
    assert_eq!(stage.state(), BuildState::Idle);
    assert!(backend
        .events()
        .iter()
        .any(|e| matches!(e, FakeEvent::Killed { .. })));
    assert_eq!(backend.live_count(BUILD), 0);
    Ok(())
}
