//! Deadline-aware step orchestrator.
//!
//! A mission is a fixed, ordered list of tasks. Each task runs one external
//! step (any program that exits 0 on success) and may carry a deadline. A run
//! evaluates how much time remains before every deadline, checks that each
//! step's artifact exists, executes the steps one after another with a bounded
//! wait, and aggregates everything into a single JSON report.

pub mod config;
pub mod error;
pub mod events;
pub mod report;
pub mod runtime;
pub mod spawner;
pub mod spec;
pub mod timeline;
pub mod truncation;
pub mod validation;

pub use config::load_mission_spec;
pub use error::ConfigError;
pub use error::ReportError;
pub use report::MissionReport;
pub use runtime::ExecutionResult;
pub use runtime::Orchestrator;
pub use runtime::Outcome;
pub use spec::MissionSpec;
pub use spec::StepSpec;
pub use spec::TaskSpec;
pub use timeline::TimelineEntry;
pub use timeline::Urgency;
