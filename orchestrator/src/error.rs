use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Problems loading or validating a mission file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read mission file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse mission file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("mission defines no tasks")]
    NoTasks,

    #[error("task and milestone names must not be empty")]
    EmptyName,

    #[error("name `{0}` is declared more than once")]
    DuplicateName(String),

    #[error("task `{0}` has an empty program")]
    EmptyProgram(String),

    #[error("task `{0}` has a zero timeout")]
    ZeroTimeout(String),

    #[error("default_timeout_secs must be greater than zero")]
    ZeroDefaultTimeout,
}

/// Serializing or writing the mission report failed. This is the only
/// failure that aborts a run.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to serialize mission report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write mission report: {0}")]
    Io(#[from] io::Error),

    #[error("failed to write mission report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
