//! Mission report aggregation and output.

use crate::error::ReportError;
use crate::runtime::ExecutionResult;
use crate::spec::MissionInfo;
use crate::spec::timestamp;
use crate::timeline::TimelineEntry;
use crate::validation::Readiness;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

/// Everything one run produced. Serialized once, then discarded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mission: Option<MissionInfo>,
    #[serde(with = "timestamp")]
    pub evaluated_at: NaiveDateTime,
    pub system_verification: IndexMap<String, bool>,
    pub timeline_analysis: IndexMap<String, TimelineEntry>,
    pub execution: Vec<ExecutionResult>,
    /// Operational over total, from the pre-run verification.
    pub readiness: f64,
    pub operational: usize,
    pub total: usize,
}

/// Merges the three products of a run. Pure: identical inputs serialize to
/// identical bytes.
pub fn build_report(
    evaluated_at: NaiveDateTime,
    timeline: IndexMap<String, TimelineEntry>,
    results: Vec<ExecutionResult>,
    readiness: &Readiness,
) -> MissionReport {
    MissionReport {
        mission: None,
        evaluated_at,
        system_verification: readiness.components.clone(),
        timeline_analysis: timeline,
        execution: results,
        readiness: readiness.fraction(),
        operational: readiness.operational(),
        total: readiness.total(),
    }
}

impl MissionReport {
    pub fn with_mission(mut self, mission: Option<MissionInfo>) -> Self {
        self.mission = mission;
        self
    }

    pub fn succeeded(&self) -> usize {
        self.execution.iter().filter(|result| result.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.execution.len() - self.succeeded()
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

/// Writes the report as one JSON document.
pub fn persist<W: Write>(report: &MissionReport, mut sink: W) -> Result<(), ReportError> {
    sink.write_all(report.to_json()?.as_bytes())?;
    sink.flush()?;
    Ok(())
}

/// Writes the report to `path`, replacing any previous run's report.
pub fn write_report_file(report: &MissionReport, path: &Path) -> Result<(), ReportError> {
    let write_err = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let file = File::create(path).map_err(write_err)?;
    persist(report, BufWriter::new(file)).map_err(|err| match err {
        ReportError::Io(source) => write_err(source),
        other => other,
    })?;

    tracing::info!(path = %path.display(), "wrote mission report");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::runtime::Outcome;
    use crate::validation::verify_components;
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;

    fn sample() -> MissionReport {
        let now = timestamp::parse("2025-11-05 12:00:00").unwrap();
        let mut deadlines = IndexMap::new();
        deadlines.insert("filing".to_string(), now + TimeDelta::hours(28));
        let timeline = crate::timeline::evaluate(&deadlines, now);
        let readiness = verify_components(["filing", "referral"], |name| name == "filing");
        let results = vec![
            ExecutionResult {
                task: "filing".to_string(),
                outcome: Outcome::Success,
                stdout: "ok\n".to_string(),
                stderr: String::new(),
                exit_code: Some(0),
                duration_ms: 12,
            },
            ExecutionResult {
                task: "referral".to_string(),
                outcome: Outcome::Failure("failed to start `python3`".to_string()),
                stdout: String::new(),
                stderr: String::new(),
                exit_code: None,
                duration_ms: 1,
            },
        ];
        build_report(now, timeline, results, &readiness)
    }

    #[test]
    fn report_has_documented_shape() {
        let report = sample().with_mission(Some(MissionInfo {
            name: "Appeal".to_string(),
            case_number: None,
            target_date: Some("2025-11-29".to_string()),
        }));
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["mission"]["name"], "Appeal");
        assert_eq!(json["evaluated_at"], "2025-11-05 12:00:00");
        assert_eq!(json["system_verification"]["filing"], true);
        assert_eq!(json["system_verification"]["referral"], false);
        assert_eq!(json["timeline_analysis"]["filing"]["status"], "CRITICAL");
        assert_eq!(json["timeline_analysis"]["filing"]["hours_remaining"], 28.0);
        assert_eq!(json["execution"][0]["outcome"]["status"], "success");
        assert_eq!(json["execution"][1]["outcome"]["status"], "failure");
        assert_eq!(
            json["execution"][1]["outcome"]["reason"],
            "failed to start `python3`"
        );
        assert_eq!(json["readiness"], 0.5);
        assert_eq!(json["operational"], 1);
        assert_eq!(json["total"], 2);
    }

    #[test]
    fn counts_successes_and_failures() {
        let report = sample();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn persist_writes_one_document() {
        let mut buf = Vec::new();
        persist(&sample(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with('{'));
        assert!(text.ends_with("}\n"));
        assert!(!text.contains("\"mission\""));
    }

    struct ClosedSink;

    impl Write for ClosedSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn persist_surfaces_sink_errors() {
        let err = persist(&sample(), ClosedSink).unwrap_err();
        assert!(matches!(err, ReportError::Io(_)));
    }

    #[test]
    fn write_report_file_overwrites_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("mission_report.json");

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale contents from an older run that is longer").unwrap();

        let report = sample();
        write_report_file(&report, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), report.to_json().unwrap());
    }

    #[test]
    fn write_report_file_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("report.json");
        write_report_file(&sample(), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn unwritable_path_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_report_file(&sample(), dir.path()).unwrap_err();
        assert!(matches!(err, ReportError::Write { .. }));
    }
}
