//! Rendering of verification records.

use serde::Serialize;

use super::{list_table, truncate, CommandOutput, DetailView};
use crate::domain::models::{CheckDetail, CheckResult, LintOutcome, VerificationRecord};

const NOTES_WIDTH: usize = 60;

/// One-line summary of a piece of evidence.
pub fn describe_detail(detail: &CheckDetail) -> String {
    match detail {
        CheckDetail::File { path, exists } => {
            format!("file {} {}", path.display(), if *exists { "found" } else { "missing" })
        }
        CheckDetail::Directory { path, exists } => {
            format!("directory {} {}", path.display(), if *exists { "found" } else { "missing" })
        }
        CheckDetail::TestCommand { command, passed, .. } => {
            format!("`{command}` {}", if *passed { "passed" } else { "failed" })
        }
        CheckDetail::Endpoint { method, url, working } => {
            format!("{method} {url} {}", if *working { "ok" } else { "unreachable" })
        }
        CheckDetail::Behavior { name, passed } => {
            format!("behavior '{name}' {}", if *passed { "passed" } else { "failed" })
        }
        CheckDetail::TestFiles { count, .. } => format!("{count} test file(s)"),
        CheckDetail::TestRun { directory, passed, error } => match error {
            Some(error) => format!("tests in {} errored: {error}", directory.display()),
            None => format!(
                "tests in {} {}",
                directory.display(),
                if *passed { "passed" } else { "failed" }
            ),
        },
        CheckDetail::Build { success: true, .. } => "build ok".to_string(),
        CheckDetail::Build { errors, .. } => format!("build failed: {}", errors.join("; ")),
        CheckDetail::Lint(LintOutcome::Passed) => "lint ok".to_string(),
        CheckDetail::Lint(LintOutcome::Failed { issues }) => {
            format!("lint failed: {}", issues.join("; "))
        }
        CheckDetail::Lint(LintOutcome::Skipped { reason }) => format!("lint skipped: {reason}"),
        CheckDetail::Hallucination(finding) => format!("{finding:?}"),
        CheckDetail::Metric { name, threshold, actual, .. } => {
            format!("{name} = {actual:.1} (limit {threshold:.1})")
        }
        CheckDetail::MeasurementFailed { name, error } => format!("{name} not measured: {error}"),
        CheckDetail::Note { message } => message.clone(),
    }
}

fn notes(check: &CheckResult) -> String {
    if let Some(error) = &check.error {
        return truncate(&format!("error: {error}"), NOTES_WIDTH);
    }
    let failing = check.failing_details();
    let shown = if failing.is_empty() { &check.details } else { &failing };
    shown
        .first()
        .map(|d| truncate(&describe_detail(d), NOTES_WIDTH))
        .unwrap_or_default()
}

/// A verification record as printed by `verify` and `report`.
#[derive(Debug, Serialize)]
pub struct ReportView {
    #[serde(flatten)]
    pub record: VerificationRecord,
    /// Set when the completion gate rejected the task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<String>,
}

impl ReportView {
    pub fn new(record: VerificationRecord) -> Self {
        Self {
            record,
            rejection: None,
        }
    }

    pub fn rejected(mut self, reason: impl Into<String>) -> Self {
        self.rejection = Some(reason.into());
        self
    }
}

impl CommandOutput for ReportView {
    fn to_human(&self) -> String {
        let record = &self.record;
        let mut view = DetailView::new(&format!("Verification {}", record.id))
            .field("Task", &record.task_id)
            .field("Status", record.status.as_str())
            .field("Confidence", &format!("{:.2}%", record.confidence))
            .field("Duration", &format!("{}ms", record.duration_ms))
            .field_opt("Error", record.error.as_deref())
            .field_opt("Rejected", self.rejection.as_deref());

        if !record.recommendations.is_empty() {
            view = view.section("Recommendations");
            for rec in &record.recommendations {
                view = view.item(&format!(
                    "[{}] {}: {}",
                    rec.severity,
                    rec.message,
                    rec.action.describe()
                ));
            }
        }

        let mut table = list_table(&["check", "score", "passed", "notes"]);
        for check in &record.checks {
            table.add_row(vec![
                check.kind.display_name().to_string(),
                format!("{:.1}/{:.0}", check.score, check.max_score),
                if check.passed { "yes" } else { "no" }.to_string(),
                notes(check),
            ]);
        }

        format!("{}\n\n{table}", view.render())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CheckKind, RunningVerification};

    #[test]
    fn test_human_output_lists_checks_and_recommendations() {
        let checks = vec![
            CheckResult::scored(
                CheckKind::Existence,
                0.0,
                vec![CheckDetail::File {
                    path: "src/foo.js".into(),
                    exists: false,
                }],
            ),
            CheckResult::scored(CheckKind::Functionality, 20.0, vec![]),
        ];
        let record = RunningVerification::start("t-1").complete(checks, 80.0);
        let human = ReportView::new(record).rejected("below threshold").to_human();

        assert!(human.contains("Task:"));
        assert!(human.contains("Existence Verification"));
        assert!(human.contains("file src/foo.js missing"));
        assert!(human.contains("[critical] Missing files or directories detected"));
        assert!(human.contains("Rejected:"));
    }

    #[test]
    fn test_json_output_flattens_record() {
        let record = RunningVerification::start("t-2").complete(vec![], 80.0);
        let json = ReportView::new(record).to_json();
        assert_eq!(json["task_id"], "t-2");
        assert!(json.get("rejection").is_none());
    }
}
