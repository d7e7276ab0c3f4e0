//! Mission, task and step definitions.
//!
//! A [`MissionSpec`] is the whole configuration of one orchestrator run: the
//! ordered task list, free-standing milestones, and the defaults applied to
//! every step. It is built once (usually from `docket.toml`) and never
//! mutated while a run is in progress.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

/// Wall-clock format used for every deadline, in configuration and reports.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const DEFAULT_TIMEOUT_SECS: u64 = 45;

pub const DEFAULT_REPORT_PATH: &str = "mission_report.json";

/// Complete definition of a mission.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MissionSpec {
    /// Descriptive header copied into the report.
    #[serde(default)]
    pub mission: Option<MissionInfo>,
    /// Where the report is written. Overwritten on every run.
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,
    /// Timeout for steps that do not declare their own.
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,
    /// Directory steps run in; relative artifacts resolve against it.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Deadlines that are not attached to a task.
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    /// Tasks in execution order.
    pub tasks: Vec<TaskSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MissionInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<String>,
}

/// A named deadline with no step attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Milestone {
    pub name: String,
    #[serde(with = "timestamp")]
    pub at: NaiveDateTime,
}

/// A named unit of work: one external step plus an optional deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskSpec {
    pub name: String,
    pub step: StepSpec,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDateTime>,
    /// Printed when the step succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,
}

/// How to invoke a step. The step is judged only by its exit status and
/// captured output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// File whose existence marks the step as ready. Defaults to the program.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_report_path() -> PathBuf {
    PathBuf::from(DEFAULT_REPORT_PATH)
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl MissionSpec {
    pub fn new(tasks: Vec<TaskSpec>) -> Self {
        Self {
            mission: None,
            report_path: default_report_path(),
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
            working_dir: None,
            milestones: Vec::new(),
            tasks,
        }
    }

    pub fn with_milestone(mut self, name: impl Into<String>, at: NaiveDateTime) -> Self {
        self.milestones.push(Milestone {
            name: name.into(),
            at,
        });
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn task(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|task| task.name == name)
    }

    /// All deadlines in report order: milestones first, then task deadlines,
    /// each in declared order.
    pub fn deadlines(&self) -> IndexMap<String, NaiveDateTime> {
        let milestones = self
            .milestones
            .iter()
            .map(|milestone| (milestone.name.clone(), milestone.at));
        let tasks = self
            .tasks
            .iter()
            .filter_map(|task| task.deadline.map(|at| (task.name.clone(), at)));
        milestones.chain(tasks).collect()
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }
}

impl TaskSpec {
    pub fn new(name: impl Into<String>, step: StepSpec) -> Self {
        Self {
            name: name.into(),
            step,
            deadline: None,
            success_message: None,
        }
    }

    pub fn with_deadline(mut self, deadline: NaiveDateTime) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    /// The step's own timeout, else the mission default.
    pub fn timeout(&self, default: Duration) -> Duration {
        self.step.timeout_secs.map_or(default, Duration::from_secs)
    }
}

impl StepSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            artifact: None,
            timeout_secs: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_artifact(mut self, artifact: impl Into<PathBuf>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Command line for log output.
    pub fn display_command(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// `serde` adapters for [`TIMESTAMP_FORMAT`] timestamps.
pub mod timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use chrono::ParseError;
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    pub fn parse(raw: &str) -> Result<NaiveDateTime, ParseError> {
        NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
    }

    pub fn render(at: &NaiveDateTime) -> String {
        at.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn serialize<S>(at: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&render(at))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(|e| {
            serde::de::Error::custom(format!(
                "invalid timestamp `{raw}` (expected YYYY-MM-DD HH:MM:SS): {e}"
            ))
        })
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::Deserialize;
        use serde::Deserializer;
        use serde::Serializer;

        pub fn serialize<S>(at: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match at {
                Some(at) => super::serialize(at, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| {
                    super::parse(&raw).map_err(|e| {
                        serde::de::Error::custom(format!(
                            "invalid timestamp `{raw}` (expected YYYY-MM-DD HH:MM:SS): {e}"
                        ))
                    })
                })
                .transpose()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(raw: &str) -> NaiveDateTime {
        timestamp::parse(raw).unwrap()
    }

    #[test]
    fn deadlines_list_milestones_before_tasks() {
        let spec = MissionSpec::new(vec![
            TaskSpec::new("file", StepSpec::new("true")).with_deadline(at("2025-11-06 16:30:00")),
            TaskSpec::new("no_deadline", StepSpec::new("true")),
        ])
        .with_milestone("hearing", at("2025-11-08 09:00:00"));

        let names: Vec<_> = spec.deadlines().into_keys().collect();
        assert_eq!(names, vec!["hearing".to_string(), "file".to_string()]);
    }

    #[test]
    fn step_timeout_overrides_default() {
        let default = Duration::from_secs(45);
        let plain = TaskSpec::new("a", StepSpec::new("true"));
        let tuned = TaskSpec::new("b", StepSpec::new("true").with_timeout_secs(30));
        assert_eq!(plain.timeout(default), default);
        assert_eq!(tuned.timeout(default), Duration::from_secs(30));
    }

    #[test]
    fn timestamp_round_trips_through_render() {
        let parsed = at("2025-11-29 00:00:00");
        assert_eq!(timestamp::render(&parsed), "2025-11-29 00:00:00");
        assert!(timestamp::parse("2025-11-29").is_err());
    }

    #[test]
    fn display_command_joins_program_and_args() {
        let step = StepSpec::new("python3").with_args(["notice.py", "--draft"]);
        assert_eq!(step.display_command(), "python3 notice.py --draft");
    }
}
