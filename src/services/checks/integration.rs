//! Integration check: the project still builds and lints cleanly.

use std::sync::Arc;

use async_trait::async_trait;

use super::{error_lines, Check, CheckEnv};
use crate::domain::models::{
    CheckDetail, CheckKind, CheckResult, LintOutcome, Task, WeightedScore,
};
use crate::domain::ports::CommandOutput;

const BUILD_WEIGHT: f64 = 10.0;
const LINT_WEIGHT: f64 = 5.0;

/// Issue lines kept when a failing tool prints no `error` lines.
const TAIL_LINES: usize = 5;

pub struct IntegrationCheck {
    env: Arc<CheckEnv>,
}

/// Error lines, or the tail of stderr when the tool failed without any.
fn issues_of(output: &CommandOutput) -> Vec<String> {
    let errors = error_lines(&output.combined());
    if !errors.is_empty() || output.success {
        return errors;
    }
    let lines: Vec<&str> = output.stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(TAIL_LINES);
    let mut tail: Vec<String> = lines[start..].iter().map(|l| (*l).to_string()).collect();
    if tail.is_empty() {
        tail.push(format!("exited with {:?}", output.exit_code));
    }
    tail
}

impl IntegrationCheck {
    pub fn new(env: Arc<CheckEnv>) -> Self {
        Self { env }
    }

    async fn build(&self, task_id: &str) -> CheckDetail {
        let spec = match self
            .env
            .configured(&self.env.commands.build, &[], self.env.command_timeout)
        {
            Ok(spec) => spec,
            Err(e) => {
                return CheckDetail::Build {
                    success: false,
                    errors: vec![e.to_string()],
                };
            }
        };

        tracing::debug!(task_id, command = %spec.display(), "Running build");
        match self.env.runner.run(&spec).await {
            Ok(output) => {
                let errors = issues_of(&output);
                CheckDetail::Build {
                    success: output.success && errors.is_empty(),
                    errors,
                }
            }
            Err(e) => CheckDetail::Build {
                success: false,
                errors: vec![e.to_string()],
            },
        }
    }

    async fn lint(&self, task_id: &str) -> LintOutcome {
        let spec = match self
            .env
            .configured(&self.env.commands.lint, &[], self.env.lint_timeout)
        {
            Ok(spec) => spec,
            Err(e) => {
                return LintOutcome::Skipped {
                    reason: e.to_string(),
                };
            }
        };

        tracing::debug!(task_id, command = %spec.display(), "Running linter");
        match self.env.runner.run(&spec).await {
            Ok(output) => {
                let issues = issues_of(&output);
                if output.success && issues.is_empty() {
                    LintOutcome::Passed
                } else {
                    LintOutcome::Failed { issues }
                }
            }
            Err(e) => {
                tracing::info!(task_id, error = %e, "Lint skipped");
                LintOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl Check for IntegrationCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Integration
    }

    async fn run(&self, task: &Task) -> anyhow::Result<CheckResult> {
        let mut score = WeightedScore::new();
        let mut details = Vec::new();

        if task.requires_build {
            let build = self.build(&task.id).await;
            score.record(BUILD_WEIGHT, !build.is_failure());
            details.push(build);
        }

        let lint = self.lint(&task.id).await;
        match &lint {
            LintOutcome::Passed => score.record(LINT_WEIGHT, true),
            LintOutcome::Failed { .. } => score.record(LINT_WEIGHT, false),
            LintOutcome::Skipped { .. } => {}
        }
        details.push(CheckDetail::Lint(lint));

        Ok(CheckResult::scored(
            self.kind(),
            score.score(self.kind().max_score()),
            details,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::process::{ScriptedCommandRunner, ScriptedResponse};
    use crate::services::checks::testing;

    async fn run(runner: ScriptedCommandRunner, task: Task) -> CheckResult {
        let dir = tempfile::tempdir().expect("temp dir");
        let check = IntegrationCheck::new(testing::env(dir.path(), Arc::new(runner)));
        check.run(&task).await.expect("check runs")
    }

    #[tokio::test]
    async fn test_clean_build_and_lint() {
        let result = run(ScriptedCommandRunner::new(), Task::new("x")).await;
        assert!((result.score - 15.0).abs() < f64::EPSILON);
        assert!(result.passed);
    }

    #[tokio::test]
    async fn test_build_errors_fail_the_check() {
        let runner = ScriptedCommandRunner::new().with_rule(
            "npm run build",
            ScriptedResponse::failure("src/a.ts(3,1)\nerror TS1005: ';' expected"),
        );
        let result = run(runner, Task::new("x")).await;

        assert!((result.score - 5.0).abs() < 1e-9);
        assert!(!result.passed);
        assert_eq!(
            result.failing_details(),
            vec![CheckDetail::Build {
                success: false,
                errors: vec!["error TS1005: ';' expected".to_string()],
            }]
        );
    }

    #[tokio::test]
    async fn test_unrunnable_lint_is_skipped() {
        let runner =
            ScriptedCommandRunner::new().with_rule("npm run lint", ScriptedResponse::SpawnError);
        let result = run(runner, Task::new("x")).await;

        assert!(result.passed);
        assert!((result.score - 15.0).abs() < f64::EPSILON);
        assert!(matches!(
            result.details.last(),
            Some(CheckDetail::Lint(LintOutcome::Skipped { .. }))
        ));
    }

    #[tokio::test]
    async fn test_build_waived_when_not_required() {
        let runner = ScriptedCommandRunner::new()
            .with_rule("npm run build", ScriptedResponse::failure("error: nope"))
            .with_rule("npm run lint", ScriptedResponse::failure(""));
        let result = run(runner, Task::new("x").without_build()).await;

        assert!(result.score.abs() < f64::EPSILON);
        assert_eq!(result.details.len(), 1);
        assert!(matches!(
            &result.details[0],
            CheckDetail::Lint(LintOutcome::Failed { issues }) if issues == &vec!["exited with Some(1)".to_string()]
        ));
    }
}
