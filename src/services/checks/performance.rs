//! Performance check: declared requirements stay under their thresholds.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Check, CheckEnv};
use crate::domain::models::{CheckDetail, CheckKind, CheckResult, Task};

/// Deducted per requirement that is exceeded or cannot be measured.
const PENALTY: f64 = 2.0;

pub struct PerformanceCheck {
    env: Arc<CheckEnv>,
}

impl PerformanceCheck {
    pub fn new(env: Arc<CheckEnv>) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Check for PerformanceCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Performance
    }

    async fn run(&self, task: &Task) -> anyhow::Result<CheckResult> {
        let mut score = self.kind().max_score();
        let mut details = Vec::new();

        for requirement in &task.performance_requirements {
            match self.env.performance.measure(requirement).await {
                Ok(actual) => {
                    let passed = actual <= requirement.threshold;
                    if !passed {
                        score -= PENALTY;
                    }
                    details.push(CheckDetail::Metric {
                        name: requirement.name.clone(),
                        threshold: requirement.threshold,
                        actual,
                        passed,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        task_id = %task.id,
                        requirement = %requirement.name,
                        error = %e,
                        "Performance measurement failed"
                    );
                    score -= PENALTY;
                    details.push(CheckDetail::MeasurementFailed {
                        name: requirement.name.clone(),
                        error: format!("{e:#}"),
                    });
                }
            }
        }

        Ok(CheckResult::scored(self.kind(), score, details))
    }
}
