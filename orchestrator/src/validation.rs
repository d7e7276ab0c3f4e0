//! Pre-run readiness checks.
//!
//! Readiness only asks whether each step's artifact can be found. It is
//! reported alongside the run and never prevents a step from executing.

use crate::spec::StepSpec;
use indexmap::IndexMap;
use std::path::Path;
use std::path::PathBuf;

/// Which tasks have a locatable artifact, in task order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Readiness {
    pub components: IndexMap<String, bool>,
}

impl Readiness {
    pub fn operational(&self) -> usize {
        self.components.values().filter(|ready| **ready).count()
    }

    pub fn total(&self) -> usize {
        self.components.len()
    }

    /// Operational over total; an empty task list counts as fully ready.
    pub fn fraction(&self) -> f64 {
        if self.total() == 0 {
            return 1.0;
        }
        self.operational() as f64 / self.total() as f64
    }

    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.components
            .iter()
            .filter(|(_, ready)| !**ready)
            .map(|(name, _)| name.as_str())
    }
}

/// Checks each name with `locate` and collects the answers in order.
pub fn verify_components<'a, I, F>(task_names: I, mut locate: F) -> Readiness
where
    I: IntoIterator<Item = &'a str>,
    F: FnMut(&str) -> bool,
{
    let components = task_names
        .into_iter()
        .map(|name| {
            let ready = locate(name);
            tracing::debug!(task = %name, ready, "verified component");
            (name.to_string(), ready)
        })
        .collect();
    Readiness { components }
}

/// Finds step artifacts on disk or on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct ArtifactLocator {
    working_dir: Option<PathBuf>,
}

impl ArtifactLocator {
    pub fn new(working_dir: Option<PathBuf>) -> Self {
        Self { working_dir }
    }

    /// An explicit artifact is a file path. Without one the program is
    /// checked: as a path if it names a directory, otherwise on `PATH`.
    pub fn locate(&self, step: &StepSpec) -> bool {
        if let Some(artifact) = &step.artifact {
            return self.resolve(artifact).exists();
        }

        let program = Path::new(&step.program);
        if program.components().count() > 1 {
            self.resolve(program).exists()
        } else {
            which::which(&step.program).is_ok()
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.working_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}
