//! Human-readable progress output.

use docket_orchestrator::ExecutionResult;
use docket_orchestrator::MissionReport;
use docket_orchestrator::MissionSpec;
use docket_orchestrator::TimelineEntry;
use docket_orchestrator::Urgency;
use docket_orchestrator::events::EventSink;
use docket_orchestrator::events::OrchestratorEvent;
use docket_orchestrator::truncation::first_line;
use docket_orchestrator::validation::Readiness;
use owo_colors::OwoColorize;
use owo_colors::Style;
use std::path::Path;

/// Prints one line per event to stdout.
#[derive(Debug, Clone, Copy)]
pub struct TerminalSink {
    color: bool,
}

impl TerminalSink {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn color_enabled() -> bool {
        supports_color::on(supports_color::Stream::Stdout).is_some()
    }

    pub fn banner(&self, spec: &MissionSpec) {
        let Some(mission) = &spec.mission else {
            return;
        };
        println!("{}", self.paint(&mission.name, Style::new().bold()));
        if let Some(case_number) = &mission.case_number {
            println!("Case: {case_number}");
        }
        if let Some(target_date) = &mission.target_date {
            println!("Target date: {target_date}");
        }
        println!();
    }

    pub fn summary(&self, report: &MissionReport, report_path: &Path) {
        println!();
        println!("{}", self.render_summary(report));
        println!("Report written to {}", report_path.display());
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    fn render_timeline_line(&self, name: &str, entry: &TimelineEntry) -> String {
        let (symbol, style) = match entry.status {
            Urgency::Critical => ("🚨", Style::new().red().bold()),
            Urgency::Urgent => ("⚡", Style::new().yellow()),
            Urgency::Scheduled => ("📅", Style::new().green()),
        };
        let status = self.paint(entry.status.as_str(), style);
        let overdue = if entry.is_overdue() { " (overdue)" } else { "" };
        format!(
            "{symbol} {status} {name}: {} days, {:.1} hours{overdue}",
            entry.days_remaining, entry.hours_remaining
        )
    }

    fn render_readiness(&self, readiness: &Readiness) -> Vec<String> {
        let mut lines: Vec<String> = readiness
            .components
            .iter()
            .map(|(name, ready)| {
                if *ready {
                    format!("✅ {name}: {}", self.paint("OPERATIONAL", Style::new().green()))
                } else {
                    format!("❌ {name}: {}", self.paint("MISSING", Style::new().red()))
                }
            })
            .collect();
        let mut summary = format!(
            "System readiness: {}/{} tasks operational",
            readiness.operational(),
            readiness.total()
        );
        let missing: Vec<&str> = readiness.missing().collect();
        if !missing.is_empty() {
            summary.push_str(&format!(" (missing: {})", missing.join(", ")));
        }
        lines.push(summary);
        lines
    }

    fn render_finished(&self, result: &ExecutionResult, success_message: Option<&str>) -> String {
        match result.failure_reason() {
            None => {
                let detail = success_message.unwrap_or("completed");
                format!("✅ {}: {detail}", result.task)
            }
            Some(reason) => format!(
                "❌ {}: {}",
                result.task,
                self.paint(first_line(reason), Style::new().red())
            ),
        }
    }

    fn render_summary(&self, report: &MissionReport) -> String {
        let failed = report.failed();
        let counts = format!("{} succeeded, {failed} failed", report.succeeded());
        let counts = if failed == 0 {
            self.paint(&counts, Style::new().green())
        } else {
            self.paint(&counts, Style::new().yellow())
        };
        format!(
            "Run complete: {counts}; {} operational, {} not operational",
            report.operational,
            report.total - report.operational
        )
    }
}

impl EventSink for TerminalSink {
    fn emit(&self, event: OrchestratorEvent) {
        match event {
            OrchestratorEvent::TimelineEvaluated { timeline } => {
                if timeline.is_empty() {
                    return;
                }
                println!("Mission timeline:");
                for (name, entry) in &timeline {
                    println!("  {}", self.render_timeline_line(name, entry));
                }
                println!();
            }
            OrchestratorEvent::ComponentsVerified { readiness } => {
                println!("Verifying components:");
                for line in self.render_readiness(&readiness) {
                    println!("  {line}");
                }
                println!();
            }
            OrchestratorEvent::TaskStarted {
                position,
                total,
                task,
                command,
            } => {
                let detail = self.paint(&command, Style::new().dimmed());
                println!("[{position}/{total}] {task} ({detail})");
            }
            OrchestratorEvent::TaskFinished {
                result,
                success_message,
                ..
            } => {
                println!("  {}", self.render_finished(&result, success_message.as_deref()));
            }
        }
    }
}
