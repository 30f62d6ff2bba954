//! Command runner backed by `tokio::process`.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;

use crate::domain::errors::CommandError;
use crate::domain::ports::{CommandOutput, CommandRunner, CommandSpec};

/// Runs commands as child processes, killing them when they exceed their
/// timeout.
#[derive(Debug, Clone, Default)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.current_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!(command = %spec.display(), timeout_ms = spec.timeout.as_millis() as u64, "Running command");

        let started = Instant::now();
        let child = cmd.spawn().map_err(|source| CommandError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(spec.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| CommandError::Spawn {
                program: spec.program.clone(),
                source,
            })?,
            Err(_) => {
                tracing::warn!(command = %spec.display(), "Command timed out");
                return Err(CommandError::Timeout {
                    program: spec.program.clone(),
                    timeout_ms: u64::try_from(spec.timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
        };

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let result = CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration_ms,
        };

        tracing::debug!(
            command = %spec.display(),
            success = result.success,
            exit_code = ?result.exit_code,
            duration_ms,
            "Command finished"
        );

        Ok(result)
    }
}
