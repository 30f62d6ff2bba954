//! Domain errors for the Taskgate verification system.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Errors raised while running an external command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Command is empty")]
    EmptyCommand,

    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` timed out after {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },
}

/// Errors raised by report storage.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Report I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Report not found: {0}")]
    NotFound(Uuid),
}

/// Errors surfaced to callers that gate task completion on verification.
#[derive(Debug, Error)]
pub enum GateError {
    #[error(
        "Task {task_id} failed verification. Confidence: {confidence:.2}%. Issues: {}",
        .issues.join(", ")
    )]
    CompletionRejected {
        task_id: String,
        confidence: f64,
        issues: Vec<String>,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;
