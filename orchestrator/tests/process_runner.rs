#![cfg(unix)]
#![allow(clippy::unwrap_used)]

use docket_orchestrator::events::NoopSink;
use docket_orchestrator::spawner::ProcessStepRunner;
use docket_orchestrator::spawner::StepError;
use docket_orchestrator::spawner::StepRunner;
use docket_orchestrator::MissionSpec;
use docket_orchestrator::Orchestrator;
use docket_orchestrator::Outcome;
use docket_orchestrator::StepSpec;
use docket_orchestrator::TaskSpec;
use pretty_assertions::assert_eq;
use std::time::Duration;
use std::time::Instant;

fn sh(script: &str) -> StepSpec {
    StepSpec::new("sh").with_args(["-c", script])
}

#[tokio::test]
async fn captures_stdout_of_successful_step() {
    let output = ProcessStepRunner::new()
        .invoke(&sh("echo drafted notice"), Duration::from_secs(10))
        .await
        .unwrap();

    assert!(output.succeeded());
    assert_eq!(output.stdout, "drafted notice\n");
    assert_eq!(output.stderr, "");
}

#[tokio::test]
async fn captures_stderr_and_exit_code_of_failing_step() {
    let output = ProcessStepRunner::new()
        .invoke(&sh("echo 'missing exhibit' >&2; exit 3"), Duration::from_secs(10))
        .await
        .unwrap();

    assert!(!output.succeeded());
    assert_eq!(output.exit_code, Some(3));
    assert_eq!(output.stderr, "missing exhibit\n");
}

#[tokio::test]
async fn missing_program_is_a_spawn_error() {
    let err = ProcessStepRunner::new()
        .invoke(
            &StepSpec::new("/nonexistent/docket-step"),
            Duration::from_secs(10),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, StepError::Spawn { .. }));
}

#[tokio::test]
async fn slow_step_times_out_without_waiting_for_it() {
    let started = Instant::now();
    let err = ProcessStepRunner::new()
        .invoke(&sh("sleep 5"), Duration::from_millis(200))
        .await
        .unwrap_err();

    assert!(matches!(err, StepError::Timeout { .. }));
    assert!(err.to_string().starts_with("timeout"));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn large_output_is_truncated_but_step_completes() {
    let output = ProcessStepRunner::new()
        .with_max_output_bytes(16)
        .invoke(&sh("head -c 100000 /dev/zero | tr '\\0' x"), Duration::from_secs(10))
        .await
        .unwrap();

    assert!(output.succeeded());
    assert!(output.stdout.starts_with("xxxxxxxxxxxxxxxx\n"));
    assert!(output.stdout.ends_with("[output truncated: 99984 bytes dropped]"));
}

#[tokio::test]
async fn runs_in_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("step.sh"), "echo from-step\n").unwrap();

    let output = ProcessStepRunner::new()
        .with_working_dir(Some(dir.path().to_path_buf()))
        .invoke(&sh(". ./step.sh"), Duration::from_secs(10))
        .await
        .unwrap();

    assert_eq!(output.stdout, "from-step\n");
}

#[tokio::test]
async fn mission_continues_past_real_failures() {
    let spec = MissionSpec::new(vec![
        TaskSpec::new("first", sh("exit 0")),
        TaskSpec::new("broken", sh("echo 'bad input' >&2; exit 1")),
        TaskSpec::new("slow", sh("sleep 5").with_timeout_secs(1)),
        TaskSpec::new("last", sh("echo finished")),
    ]);
    let orchestrator = Orchestrator::new(spec);

    let results = orchestrator.run_all(&NoopSink).await;

    assert_eq!(results.len(), 4);
    assert_eq!(results[0].outcome, Outcome::Success);
    assert_eq!(results[1].outcome, Outcome::Failure("bad input".to_string()));
    assert!(results[2].failure_reason().unwrap().starts_with("timeout"));
    assert_eq!(results[3].outcome, Outcome::Success);
    assert_eq!(results[3].stdout, "finished\n");
}
