//! Loading `docket.toml`.

use crate::error::ConfigError;
use crate::error::Result;
use crate::spec::MissionSpec;
use std::collections::HashSet;
use std::path::Path;

/// Default mission file name, looked up in the current directory.
pub const MISSION_FILE: &str = "docket.toml";

/// Reads and validates a mission file. A relative `working_dir` is resolved
/// against the directory containing the file.
pub fn load_mission_spec(path: &Path) -> Result<MissionSpec> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut spec = parse_mission_spec(&contents)?;

    if let Some(dir) = spec.working_dir.as_ref()
        && dir.is_relative()
        && let Some(parent) = path.parent()
    {
        spec.working_dir = Some(parent.join(dir));
    }

    tracing::debug!(
        path = %path.display(),
        tasks = spec.tasks.len(),
        milestones = spec.milestones.len(),
        "loaded mission file"
    );
    Ok(spec)
}

pub fn parse_mission_spec(contents: &str) -> Result<MissionSpec> {
    let spec: MissionSpec = toml::from_str(contents)?;
    validate(&spec)?;
    Ok(spec)
}

/// Checks the invariants the orchestrator relies on: at least one task,
/// unique non-empty names across tasks and milestones, runnable steps.
pub fn validate(spec: &MissionSpec) -> Result<()> {
    if spec.tasks.is_empty() {
        return Err(ConfigError::NoTasks);
    }
    if spec.default_timeout_secs == 0 {
        return Err(ConfigError::ZeroDefaultTimeout);
    }

    let mut seen = HashSet::new();
    let names = spec
        .milestones
        .iter()
        .map(|milestone| milestone.name.as_str())
        .chain(spec.tasks.iter().map(|task| task.name.as_str()));
    for name in names {
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateName(name.to_string()));
        }
    }

    for task in &spec.tasks {
        if task.step.program.trim().is_empty() {
            return Err(ConfigError::EmptyProgram(task.name.clone()));
        }
        if task.step.timeout_secs == Some(0) {
            return Err(ConfigError::ZeroTimeout(task.name.clone()));
        }
    }
    Ok(())
}
