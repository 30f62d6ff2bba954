//! Hallucination check: claims and references in the task hold up.
//!
//! Starts at full score and is debited per finding. Any finding fails it.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::{extraction, Check, CheckEnv};
use crate::domain::models::{CheckDetail, CheckKind, CheckResult, HallucinationFinding, Task};

pub struct HallucinationCheck {
    env: Arc<CheckEnv>,
}

impl HallucinationCheck {
    pub fn new(env: Arc<CheckEnv>) -> Self {
        Self { env }
    }

    /// Whether a codebase text search finds `name` outside the report
    /// directory.
    async fn reference_exists(&self, task_id: &str, name: &str) -> bool {
        let reports = self.env.report_dir_name();
        let spec = match self.env.configured(
            &self.env.commands.search,
            &[("query", name), ("reports", reports.as_str())],
            self.env.command_timeout,
        ) {
            Ok(spec) => spec,
            Err(e) => {
                tracing::warn!(task_id, reference = name, error = %e, "Search command unusable");
                return false;
            }
        };

        match self.env.runner.run(&spec).await {
            Ok(output) => {
                output.success
                    && output
                        .stdout
                        .lines()
                        .map(str::trim)
                        .filter(|hit| !hit.is_empty())
                        .any(|hit| !self.env.is_report_path(Path::new(hit)))
            }
            Err(e) => {
                tracing::warn!(task_id, reference = name, error = %e, "Reference search failed");
                false
            }
        }
    }
}

#[async_trait]
impl Check for HallucinationCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Hallucination
    }

    async fn run(&self, task: &Task) -> anyhow::Result<CheckResult> {
        let mut findings = Vec::new();

        for claim in task.claims.iter().filter(|c| !c.is_valid()) {
            findings.push(HallucinationFinding::ImpossibleClaim {
                claim: claim.description.clone(),
                reason: claim.validation_error.clone(),
            });
        }

        for reference in extraction::references(&task.description) {
            if !self.reference_exists(&task.id, &reference).await {
                findings.push(HallucinationFinding::NonExistentReference { reference });
            }
        }

        for description in extraction::contradictions(&task.description) {
            findings.push(HallucinationFinding::Contradiction { description });
        }

        let max = self.kind().max_score();
        let penalty: f64 = findings.iter().map(HallucinationFinding::penalty).sum();
        if !findings.is_empty() {
            tracing::info!(
                task_id = %task.id,
                findings = findings.len(),
                penalty,
                "Hallucinations detected"
            );
        }

        let passed = findings.is_empty();
        let details = findings.into_iter().map(CheckDetail::Hallucination).collect();
        Ok(CheckResult::scored(self.kind(), max - penalty, details).with_passed(passed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Claim;
    use crate::infrastructure::process::{ScriptedCommandRunner, ScriptedResponse};
    use crate::services::checks::testing;

    async fn run(runner: ScriptedCommandRunner, task: Task) -> CheckResult {
        let dir = tempfile::tempdir().expect("temp dir");
        let check = HallucinationCheck::new(testing::env(dir.path(), Arc::new(runner)));
        check.run(&task).await.expect("check runs")
    }

    #[tokio::test]
    async fn test_impossible_claim_costs_five() {
        let task = Task::new("Speed up parsing").with_claim(Claim {
            description: "Parses any input in O(1)".to_string(),
            impossible: true,
            contradictory: false,
            validation_error: Some("input must be read".to_string()),
        });
        let result = run(ScriptedCommandRunner::new(), task).await;

        assert!((result.score - 15.0).abs() < f64::EPSILON);
        assert!(!result.passed);
        assert_eq!(
            result.details,
            vec![CheckDetail::Hallucination(HallucinationFinding::ImpossibleClaim {
                claim: "Parses any input in O(1)".to_string(),
                reason: Some("input must be read".to_string()),
            })]
        );
    }

    #[tokio::test]
    async fn test_unfound_reference_and_contradiction() {
        let runner = ScriptedCommandRunner::new()
            .with_rule("UserStore", ScriptedResponse::success("src/store.js\n"))
            .with_rule("Ghost", ScriptedResponse::failure(""));
        let task = Task::new("Wire class UserStore into component Ghost, async but synchronous");
        let result = run(runner, task).await;

        // -3 (Ghost) -2 (contradiction)
        assert!((result.score - 15.0).abs() < f64::EPSILON);
        assert_eq!(result.details.len(), 2);
        assert!(!result.passed);
    }

    #[tokio::test]
    async fn test_hits_in_report_directory_do_not_count() {
        let runner = Arc::new(ScriptedCommandRunner::new().with_rule(
            "GhostWidget",
            ScriptedResponse::success("./verification-reports/verification-1.json\n"),
        ));
        let dir = tempfile::tempdir().expect("temp dir");
        let check = HallucinationCheck::new(testing::env(dir.path(), runner.clone()));
        let result = check
            .run(&Task::new("Add class GhostWidget"))
            .await
            .expect("check runs");

        assert!((result.score - 17.0).abs() < f64::EPSILON);
        assert!(!result.passed);
        let calls = runner.calls().await;
        assert!(calls[0].contains("--exclude-dir=verification-reports"));
        assert!(calls[0].contains("--include=*.js"));
    }

    #[tokio::test]
    async fn test_clean_task_keeps_full_score() {
        let result = run(ScriptedCommandRunner::new(), Task::new("Tidy the README")).await;
        assert!((result.score - 20.0).abs() < f64::EPSILON);
        assert!(result.passed);
        assert!(result.details.is_empty());
    }

    #[tokio::test]
    async fn test_score_floors_at_zero() {
        let claim = Claim {
            description: "impossible".to_string(),
            impossible: true,
            contradictory: true,
            validation_error: None,
        };
        let task = (0..5).fold(Task::new("x"), |t, _| t.with_claim(claim.clone()));
        let result = run(ScriptedCommandRunner::new(), task).await;
        assert!(result.score.abs() < f64::EPSILON);
    }
}
