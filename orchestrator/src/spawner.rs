//! Step invocation.
//!
//! A step is any external program. [`StepRunner`] is the seam the executor
//! talks to; [`ProcessStepRunner`] spawns the program as a child process,
//! captures stdout/stderr and bounds the wait with a timeout.

use crate::spec::StepSpec;
use crate::truncation::MAX_CAPTURED_BYTES;
use crate::truncation::OutputTruncator;
use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// What a finished step left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl StepOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Human-readable exit status, used when a failing step wrote nothing
    /// to stderr.
    pub fn describe_exit(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by a signal".to_string(),
        }
    }
}

/// The step could not be run to completion.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed waiting for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("timeout: `{program}` did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },
}

#[async_trait]
pub trait StepRunner: Send + Sync {
    /// Runs `step` once, waiting at most `timeout`.
    async fn invoke(&self, step: &StepSpec, timeout: Duration) -> Result<StepOutput, StepError>;
}

/// Runs steps as child processes.
#[derive(Debug, Clone)]
pub struct ProcessStepRunner {
    working_dir: Option<PathBuf>,
    max_output_bytes: usize,
}

impl ProcessStepRunner {
    pub fn new() -> Self {
        Self {
            working_dir: None,
            max_output_bytes: MAX_CAPTURED_BYTES,
        }
    }

    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn with_max_output_bytes(mut self, limit: usize) -> Self {
        self.max_output_bytes = limit;
        self
    }

    /// `./step.sh` style programs are resolved against the working directory
    /// here; `Command` leaves that case platform-specific.
    fn resolve_program(&self, program: &str) -> PathBuf {
        let path = Path::new(program);
        match self.working_dir.as_deref() {
            Some(dir) if path.is_relative() && path.components().count() > 1 => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl Default for ProcessStepRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepRunner for ProcessStepRunner {
    async fn invoke(&self, step: &StepSpec, timeout: Duration) -> Result<StepOutput, StepError> {
        let mut cmd = Command::new(self.resolve_program(&step.program));
        cmd.args(&step.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the child on timeout kills it.
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| StepError::Spawn {
            program: step.program.clone(),
            source,
        })?;
        tracing::debug!(
            command = %step.display_command(),
            pid = ?child.id(),
            "spawned step"
        );

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = self.max_output_bytes;
        let run = async {
            tokio::join!(
                child.wait(),
                read_capped(stdout, limit),
                read_capped(stderr, limit),
            )
        };

        match tokio::time::timeout(timeout, run).await {
            Ok((Ok(status), stdout, stderr)) => Ok(StepOutput {
                stdout,
                stderr,
                exit_code: status.code(),
            }),
            Ok((Err(source), _, _)) => Err(StepError::Wait {
                program: step.program.clone(),
                source,
            }),
            Err(_elapsed) => Err(StepError::Timeout {
                program: step.program.clone(),
                timeout,
            }),
        }
    }
}

/// Drains a pipe to EOF, keeping at most `limit` bytes.
async fn read_capped<R: AsyncRead + Unpin>(handle: Option<R>, limit: usize) -> String {
    let mut truncator = OutputTruncator::new(limit);
    if let Some(mut reader) = handle {
        let mut chunk = [0u8; 8192];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => truncator.push(&chunk[..n]),
                Err(err) => {
                    tracing::warn!(error = %err, "stopped reading step output");
                    break;
                }
            }
        }
    }
    if truncator.dropped_bytes() > 0 {
        tracing::debug!(
            kept = limit,
            dropped = truncator.dropped_bytes(),
            "truncated step output"
        );
    }
    truncator.finish()
}
