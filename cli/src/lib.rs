//! Command-line front end for the docket orchestrator.

mod display;

pub use display::TerminalSink;

use anyhow::Context;
use chrono::Local;
use chrono::NaiveDateTime;
use clap::Parser;
use docket_orchestrator::MissionReport;
use docket_orchestrator::Orchestrator;
use docket_orchestrator::config::MISSION_FILE;
use docket_orchestrator::load_mission_spec;
use docket_orchestrator::report::write_report_file;
use docket_orchestrator::spec::timestamp;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Run a mission's steps in order and report how close each deadline is.
#[derive(Debug, Parser)]
#[command(name = "docket", version)]
pub struct Cli {
    /// Mission file.
    #[arg(short, long, value_name = "FILE", default_value = MISSION_FILE)]
    pub config: PathBuf,

    /// Where to write the report. Overrides `report_path` in the mission file.
    #[arg(short = 'o', long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Evaluate deadlines as of this instant instead of the local clock.
    #[arg(long, value_name = "YYYY-MM-DD HH:MM:SS", value_parser = parse_instant)]
    pub now: Option<NaiveDateTime>,

    /// Log progress details to stderr (RUST_LOG takes precedence).
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_instant(raw: &str) -> Result<NaiveDateTime, String> {
    timestamp::parse(raw).map_err(|e| format!("expected YYYY-MM-DD HH:MM:SS: {e}"))
}

/// Logs go to stderr so stdout carries only progress lines.
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Loads the mission, runs it and writes the report. Task failures are part
/// of a completed run; only loading the mission or writing the report can
/// fail here.
pub async fn run_main(cli: Cli) -> anyhow::Result<MissionReport> {
    let spec = load_mission_spec(&cli.config)
        .with_context(|| format!("could not load mission from {}", cli.config.display()))?;
    let report_path = cli.report.unwrap_or_else(|| spec.report_path.clone());
    let now = cli.now.unwrap_or_else(|| Local::now().naive_local());

    tracing::info!(
        config = %cli.config.display(),
        report = %report_path.display(),
        now = %timestamp::render(&now),
        "starting mission"
    );

    let orchestrator = Orchestrator::new(spec);
    let sink = TerminalSink::new(TerminalSink::color_enabled());
    sink.banner(orchestrator.spec());

    let report = orchestrator.run(now, &sink).await;

    write_report_file(&report, &report_path)
        .with_context(|| format!("could not write report to {}", report_path.display()))?;
    sink.summary(&report, &report_path);

    Ok(report)
}
