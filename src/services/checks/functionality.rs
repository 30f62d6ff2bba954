//! Functionality check: the feature runs.
//!
//! Evidence comes from the task's test command, its endpoints and its
//! behavior scripts. A test command that cannot be run at all fails the check
//! with an error rather than a score.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;

use super::{Check, CheckEnv};
use crate::domain::models::{Behavior, CheckDetail, CheckKind, CheckResult, Task, WeightedScore};

const TEST_COMMAND_WEIGHT: f64 = 20.0;
const ENDPOINT_WEIGHT: f64 = 5.0;
const BEHAVIOR_WEIGHT: f64 = 3.0;

/// Output kept on a test command detail.
const OUTPUT_LIMIT: usize = 500;

pub struct FunctionalityCheck {
    env: Arc<CheckEnv>,
}

impl FunctionalityCheck {
    pub fn new(env: Arc<CheckEnv>) -> Self {
        Self { env }
    }

    async fn behavior_passes(&self, task_id: &str, behavior: &Behavior) -> bool {
        let Some(script) = &behavior.test_script else {
            return false;
        };
        let spec = self.env.shell(script, self.env.behavior_timeout);
        match self.env.runner.run(&spec).await {
            Ok(output) => output.success && output.stdout.contains(&behavior.expected_output),
            Err(e) => {
                tracing::debug!(task_id, behavior = %behavior.name, error = %e, "Behavior script did not run");
                false
            }
        }
    }
}

fn truncate(output: &str) -> String {
    output.chars().take(OUTPUT_LIMIT).collect()
}

#[async_trait]
impl Check for FunctionalityCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Functionality
    }

    async fn run(&self, task: &Task) -> anyhow::Result<CheckResult> {
        let mut score = WeightedScore::new();
        let mut details = Vec::new();

        if let Some(command) = &task.test_command {
            let spec = self.env.shell(command, self.env.command_timeout);
            let output = self
                .env
                .runner
                .run(&spec)
                .await
                .with_context(|| format!("test command `{command}` did not complete"))?;
            let passed = output.success && output.stdout.contains("passed");
            score.record(TEST_COMMAND_WEIGHT, passed);
            details.push(CheckDetail::TestCommand {
                command: command.clone(),
                passed,
                output: truncate(&output.stdout),
            });
        }

        for endpoint in &task.endpoints {
            let working = self.env.prober.probe(endpoint).await;
            score.record(ENDPOINT_WEIGHT, working);
            details.push(CheckDetail::Endpoint {
                method: endpoint.method.clone(),
                url: endpoint.url.clone(),
                working,
            });
        }

        for behavior in &task.behaviors {
            let passed = self.behavior_passes(&task.id, behavior).await;
            score.record(BEHAVIOR_WEIGHT, passed);
            details.push(CheckDetail::Behavior {
                name: behavior.name.clone(),
                passed,
            });
        }

        if score.is_empty() {
            details.push(CheckDetail::note("No test command, endpoints or behaviors declared"));
        }

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
    use crate::domain::models::Endpoint;
    use crate::infrastructure::process::{ScriptedCommandRunner, ScriptedResponse};
    use crate::services::checks::testing;
    use mockito::Server;

    fn check(runner: ScriptedCommandRunner) -> (tempfile::TempDir, FunctionalityCheck) {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = testing::env(dir.path(), Arc::new(runner));
        (dir, FunctionalityCheck::new(env))
    }

    #[tokio::test]
    async fn test_passing_test_command() {
        let runner = ScriptedCommandRunner::new()
            .with_rule("npm run e2e", ScriptedResponse::success("12 passed, 0 failed"));
        let (_dir, check) = check(runner);

        let result = check
            .run(&Task::new("Checkout flow").with_test_command("npm run e2e"))
            .await
            .expect("check runs");
        assert!((result.score - 20.0).abs() < f64::EPSILON);
        assert!(result.passed);
    }

    #[tokio::test]
    async fn test_failing_command_and_behavior() {
        let runner = ScriptedCommandRunner::new()
            .with_rule("npm run e2e", ScriptedResponse::failure("1 failed"))
            .with_rule("./demo.sh", ScriptedResponse::success("all good: success"));
        let (_dir, check) = check(runner);

        let task = Task::new("Checkout flow")
            .with_test_command("npm run e2e")
            .with_behavior(Behavior {
                name: "demo".to_string(),
                test_script: Some("./demo.sh".to_string()),
                expected_output: "success".to_string(),
            })
            .with_behavior(Behavior {
                name: "unscripted".to_string(),
                test_script: None,
                expected_output: "success".to_string(),
            });
        let result = check.run(&task).await.expect("check runs");

        // 3 of 26
        assert!((result.score - 20.0 * 3.0 / 26.0).abs() < 1e-9);
        assert!(!result.passed);
        assert_eq!(result.failing_details().len(), 2);
    }

    #[tokio::test]
    async fn test_unrunnable_test_command_is_error() {
        let runner = ScriptedCommandRunner::new().with_rule("npm run e2e", ScriptedResponse::Timeout);
        let (_dir, check) = check(runner);
        let result = check
            .run(&Task::new("x").with_test_command("npm run e2e"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_endpoints_are_probed() {
        let mut server = Server::new_async().await;
        let _ok = server.mock("GET", "/health").with_status(200).create_async().await;
        let _down = server.mock("GET", "/broken").with_status(503).create_async().await;

        let (_dir, check) = check(ScriptedCommandRunner::new());
        let task = Task::new("Service")
            .with_endpoint(Endpoint::get(format!("{}/health", server.url())))
            .with_endpoint(Endpoint::get(format!("{}/broken", server.url())));
        let result = check.run(&task).await.expect("check runs");

        assert!((result.score - 10.0).abs() < 1e-9);
        assert!(!result.passed);
    }

    #[tokio::test]
    async fn test_nothing_declared_is_full_marks() {
        let (_dir, check) = check(ScriptedCommandRunner::new());
        let result = check.run(&Task::new("Refactor")).await.expect("check runs");
        assert!((result.score - 20.0).abs() < f64::EPSILON);
        assert!(result.passed);
    }
}
