//! Progress events emitted while a mission runs.

use crate::runtime::ExecutionResult;
use crate::timeline::TimelineEntry;
use crate::validation::Readiness;
use indexmap::IndexMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum OrchestratorEvent {
    TimelineEvaluated {
        timeline: IndexMap<String, TimelineEntry>,
    },
    ComponentsVerified {
        readiness: Readiness,
    },
    TaskStarted {
        /// 1-based position in the task list.
        position: usize,
        total: usize,
        task: String,
        command: String,
    },
    TaskFinished {
        position: usize,
        total: usize,
        result: ExecutionResult,
        success_message: Option<String>,
    },
}

/// Receives events as they happen.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: OrchestratorEvent);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: OrchestratorEvent) {}
}

/// Keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<OrchestratorEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OrchestratorEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: OrchestratorEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Helper that builds task events for one run.
pub struct EventEmitter<'a> {
    sink: &'a dyn EventSink,
    total: usize,
}

impl<'a> EventEmitter<'a> {
    pub fn new(sink: &'a dyn EventSink, total: usize) -> Self {
        Self { sink, total }
    }

    pub fn task_started(&self, index: usize, task: &str, command: String) {
        self.sink.emit(OrchestratorEvent::TaskStarted {
            position: index + 1,
            total: self.total,
            task: task.to_string(),
            command,
        });
    }

    pub fn task_finished(
        &self,
        index: usize,
        result: ExecutionResult,
        success_message: Option<String>,
    ) {
        self.sink.emit(OrchestratorEvent::TaskFinished {
            position: index + 1,
            total: self.total,
            result,
            success_message,
        });
    }
}
