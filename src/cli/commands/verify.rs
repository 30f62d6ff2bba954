use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::cli::display::{output, ReportView};
use crate::cli::service::VerificationService;
use crate::domain::errors::GateError;
use crate::domain::models::{Config, Task};

/// Load a task definition, YAML or JSON by extension.
pub fn load_task(path: &Path) -> Result<Task> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read task file {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let task = if is_json {
        serde_json::from_str(&body).context("Failed to parse task JSON")?
    } else {
        serde_yaml::from_str(&body).context("Failed to parse task YAML")?
    };
    Ok(task)
}

/// Verify a task file through the completion gate.
///
/// Returns whether the task may be marked complete.
pub async fn execute(task_file: &Path, config: &Config, json: bool) -> Result<bool> {
    let task = load_task(task_file)?.enrich();
    let task_id = task.id.clone();
    let service = VerificationService::from_config(config)?;
    let orchestrator = service.orchestrator();

    let (record, rejection) = match orchestrator.verify_for_completion(task).await {
        Ok(outcome) => (outcome.record, None),
        Err(err @ GateError::CompletionRejected { .. }) => {
            let record = orchestrator
                .engine()
                .history_for(&task_id)
                .await
                .pop()
                .ok_or_else(|| anyhow!("No verification recorded for {task_id}"))?;
            (record, Some(err.to_string()))
        }
    };

    let accepted = rejection.is_none();
    let mut view = ReportView::new(record);
    if let Some(reason) = rejection {
        view = view.rejected(reason);
    }
    output(&view, json);
    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_task_by_extension() {
        let dir = tempfile::tempdir().expect("temp dir");
        let yaml = dir.path().join("task.yaml");
        std::fs::write(&yaml, "id: t-1\ndescription: Add src/lib.rs\n").expect("write");
        let json = dir.path().join("task.json");
        std::fs::write(&json, r#"{"description": "Add docs", "requires_build": false}"#).expect("write");

        let from_yaml = load_task(&yaml).expect("yaml loads");
        assert_eq!(from_yaml.id, "t-1");
        let from_json = load_task(&json).expect("json loads");
        assert!(!from_json.requires_build);
    }

    #[test]
    fn test_load_task_reports_missing_file() {
        let err = load_task(Path::new("/nonexistent/task.yaml")).expect_err("missing");
        assert!(err.to_string().contains("Failed to read task file"));
    }
}
