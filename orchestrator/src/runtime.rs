//! Core orchestrator runtime.
//!
//! One run walks a fixed sequence: evaluate deadlines, verify components,
//! execute every task in declared order, then aggregate the report. Tasks run
//! one at a time and a failing task never stops the ones after it.

use crate::events::EventEmitter;
use crate::events::EventSink;
use crate::events::OrchestratorEvent;
use crate::report::MissionReport;
use crate::report::build_report;
use crate::spawner::ProcessStepRunner;
use crate::spawner::StepError;
use crate::spawner::StepOutput;
use crate::spawner::StepRunner;
use crate::spec::MissionSpec;
use crate::spec::TaskSpec;
use crate::timeline::TimelineEntry;
use crate::timeline::evaluate;
use crate::validation::ArtifactLocator;
use crate::validation::Readiness;
use crate::validation::verify_components;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::Serialize;
use std::time::Duration;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure(String),
}

/// The single result a task produces in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub task: String,
    pub outcome: Outcome,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Folds an invocation into a result. Non-zero exits fail with the
    /// step's stderr; invocation errors fail with the error message.
    pub fn from_invocation(
        task: &str,
        invocation: Result<StepOutput, StepError>,
        elapsed: Duration,
    ) -> Self {
        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        match invocation {
            Ok(output) => {
                let outcome = if output.succeeded() {
                    Outcome::Success
                } else if output.stderr.trim().is_empty() {
                    Outcome::Failure(output.describe_exit())
                } else {
                    Outcome::Failure(output.stderr.trim().to_string())
                };
                Self {
                    task: task.to_string(),
                    outcome,
                    stdout: output.stdout,
                    stderr: output.stderr,
                    exit_code: output.exit_code,
                    duration_ms,
                }
            }
            Err(err) => Self {
                task: task.to_string(),
                outcome: Outcome::Failure(err.to_string()),
                stdout: String::new(),
                stderr: String::new(),
                exit_code: None,
                duration_ms,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Success => None,
            Outcome::Failure(reason) => Some(reason),
        }
    }
}

/// Runs every task once, in order, and returns one result per task.
pub async fn run_all<R>(
    runner: &R,
    tasks: &[TaskSpec],
    default_timeout: Duration,
    sink: &dyn EventSink,
) -> Vec<ExecutionResult>
where
    R: StepRunner + ?Sized,
{
    let emitter = EventEmitter::new(sink, tasks.len());
    let mut results = Vec::with_capacity(tasks.len());

    for (index, task) in tasks.iter().enumerate() {
        let timeout = task.timeout(default_timeout);
        let command = task.step.display_command();
        tracing::info!(
            task = %task.name,
            command = %command,
            timeout = ?timeout,
            "running step"
        );
        emitter.task_started(index, &task.name, command);

        let started = Instant::now();
        let invocation = runner.invoke(&task.step, timeout).await;
        let result = ExecutionResult::from_invocation(&task.name, invocation, started.elapsed());

        match &result.outcome {
            Outcome::Success => {
                tracing::info!(task = %task.name, duration_ms = result.duration_ms, "step succeeded");
            }
            Outcome::Failure(reason) => {
                tracing::warn!(
                    task = %task.name,
                    exit_code = ?result.exit_code,
                    reason = %reason,
                    "step failed, continuing with next task"
                );
            }
        }

        emitter.task_finished(index, result.clone(), task.success_message.clone());
        results.push(result);
    }

    results
}

/// Drives one mission. Holds no state between runs.
pub struct Orchestrator<R = ProcessStepRunner> {
    spec: MissionSpec,
    runner: R,
    locator: ArtifactLocator,
}

impl Orchestrator<ProcessStepRunner> {
    /// Orchestrator that runs steps as child processes.
    pub fn new(spec: MissionSpec) -> Self {
        let runner = ProcessStepRunner::new().with_working_dir(spec.working_dir.clone());
        Self::with_runner(spec, runner)
    }
}

impl<R: StepRunner> Orchestrator<R> {
    pub fn with_runner(spec: MissionSpec, runner: R) -> Self {
        let locator = ArtifactLocator::new(spec.working_dir.clone());
        Self {
            spec,
            runner,
            locator,
        }
    }

    pub fn spec(&self) -> &MissionSpec {
        &self.spec
    }

    pub fn evaluate_timeline(&self, now: NaiveDateTime) -> IndexMap<String, TimelineEntry> {
        evaluate(&self.spec.deadlines(), now)
    }

    pub fn verify_components(&self) -> Readiness {
        verify_components(
            self.spec.tasks.iter().map(|task| task.name.as_str()),
            |name| {
                self.spec
                    .task(name)
                    .is_some_and(|task| self.locator.locate(&task.step))
            },
        )
    }

    pub async fn run_all(&self, sink: &dyn EventSink) -> Vec<ExecutionResult> {
        run_all(
            &self.runner,
            &self.spec.tasks,
            self.spec.default_timeout(),
            sink,
        )
        .await
    }

    /// Evaluates deadlines at `now`, verifies components, runs every task and
    /// returns the aggregated report. Writing the report is up to the caller.
    pub async fn run(&self, now: NaiveDateTime, sink: &dyn EventSink) -> MissionReport {
        let timeline = self.evaluate_timeline(now);
        sink.emit(OrchestratorEvent::TimelineEvaluated {
            timeline: timeline.clone(),
        });

        let readiness = self.verify_components();
        tracing::info!(
            operational = readiness.operational(),
            total = readiness.total(),
            "verified components"
        );
        sink.emit(OrchestratorEvent::ComponentsVerified {
            readiness: readiness.clone(),
        });

        let results = self.run_all(sink).await;

        build_report(now, timeline, results, &readiness).with_mission(self.spec.mission.clone())
    }
}
