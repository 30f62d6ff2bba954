//! Verification Engine.
//!
//! Runs the check suite against a task, aggregates a confidence score and
//! returns a verdict with recommendations. The engine never fails a call:
//! a check that errors or times out scores zero, and a panic anywhere in the
//! pipeline produces a record with status `error`.
//!
//! Every attempt is kept in an append-only history and written to the
//! report store.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::ReportResult;
use crate::domain::models::{
    CheckDetail, CheckKind, CheckResult, EngineConfig, HallucinationFinding, RunningVerification,
    Task, VerificationOutcome, VerificationRecord, VerificationStatus,
};
use crate::domain::ports::ReportStore;
use crate::services::checks::{standard_checks, Check, CheckEnv};

/// Hallucinations found for a task in one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallucinationRecord {
    pub task_id: String,
    pub verification_id: Uuid,
    pub findings: Vec<HallucinationFinding>,
    pub detected_at: DateTime<Utc>,
}

/// Aggregates over the engine's history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStatistics {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    /// Percentage of attempts that passed.
    pub pass_rate: f64,
    pub average_confidence: f64,
    pub hallucinations_detected: usize,
}

pub struct VerificationEngine {
    checks: Vec<Box<dyn Check>>,
    reports: Arc<dyn ReportStore>,
    pass_threshold: f64,
    check_timeout: Duration,
    history: RwLock<Vec<VerificationRecord>>,
    hallucinations: RwLock<Vec<HallucinationRecord>>,
}

impl VerificationEngine {
    /// Engine running the standard suite over `env`.
    pub fn new(env: Arc<CheckEnv>, reports: Arc<dyn ReportStore>, config: &EngineConfig) -> Self {
        Self::with_checks(standard_checks(&env), reports, config)
    }

    /// Engine running a custom suite, in the given order.
    pub fn with_checks(
        checks: Vec<Box<dyn Check>>,
        reports: Arc<dyn ReportStore>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            checks,
            reports,
            pass_threshold: config.pass_threshold(),
            check_timeout: Duration::from_millis(config.check_timeout_ms),
            history: RwLock::new(Vec::new()),
            hallucinations: RwLock::new(Vec::new()),
        }
    }

    pub fn pass_threshold(&self) -> f64 {
        self.pass_threshold
    }

    /// Verify a task once.
    pub async fn verify(&self, task: &Task) -> VerificationOutcome {
        let running = RunningVerification::start(&task.id);
        let verification_id = running.id();
        tracing::info!(
            task_id = %task.id,
            verification_id = %verification_id,
            "Starting verification"
        );

        let record = match AssertUnwindSafe(self.run_pipeline(task)).catch_unwind().await {
            Ok(checks) => running.complete(checks, self.pass_threshold),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(
                    task_id = %task.id,
                    verification_id = %verification_id,
                    error = %message,
                    "Verification pipeline panicked"
                );
                running.fail(Vec::new(), format!("verification pipeline panicked: {message}"))
            }
        };

        tracing::info!(
            task_id = %record.task_id,
            verification_id = %record.id,
            status = %record.status,
            confidence = record.confidence,
            duration_ms = record.duration_ms,
            "Verification finished"
        );

        self.log_hallucinations(&record).await;
        if let Err(e) = self.reports.save(&record).await {
            tracing::warn!(verification_id = %record.id, error = %e, "Failed to write verification report");
        }
        self.history.write().await.push(record.clone());

        VerificationOutcome::from(record)
    }

    async fn run_pipeline(&self, task: &Task) -> Vec<CheckResult> {
        let mut results = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            results.push(self.run_check(check.as_ref(), task).await);
        }
        results
    }

    async fn run_check(&self, check: &dyn Check, task: &Task) -> CheckResult {
        let kind = check.kind();
        match tokio::time::timeout(self.check_timeout, check.run(task)).await {
            Ok(Ok(result)) => {
                tracing::debug!(
                    task_id = %task.id,
                    check = %kind,
                    score = result.score,
                    passed = result.passed,
                    "Check finished"
                );
                result
            }
            Ok(Err(e)) => {
                tracing::warn!(task_id = %task.id, check = %kind, error = %e, "Check failed to run");
                CheckResult::errored(kind, format!("{e:#}"))
            }
            Err(_) => {
                tracing::warn!(
                    task_id = %task.id,
                    check = %kind,
                    timeout_ms = u64::try_from(self.check_timeout.as_millis()).unwrap_or(u64::MAX),
                    "Check timed out"
                );
                CheckResult::errored(
                    kind,
                    format!("timed out after {}ms", self.check_timeout.as_millis()),
                )
            }
        }
    }

    async fn log_hallucinations(&self, record: &VerificationRecord) {
        let findings: Vec<HallucinationFinding> = record
            .check(CheckKind::Hallucination)
            .into_iter()
            .flat_map(|c| c.details.iter())
            .filter_map(|d| match d {
                CheckDetail::Hallucination(finding) => Some(finding.clone()),
                _ => None,
            })
            .collect();
        if findings.is_empty() {
            return;
        }
        self.hallucinations.write().await.push(HallucinationRecord {
            task_id: record.task_id.clone(),
            verification_id: record.id,
            findings,
            detected_at: record.finished_at,
        });
    }

    /// Every attempt so far, oldest first.
    pub async fn history(&self) -> Vec<VerificationRecord> {
        self.history.read().await.clone()
    }

    pub async fn history_for(&self, task_id: &str) -> Vec<VerificationRecord> {
        self.history
            .read()
            .await
            .iter()
            .filter(|r| r.task_id == task_id)
            .cloned()
            .collect()
    }

    pub async fn hallucination_log(&self) -> Vec<HallucinationRecord> {
        self.hallucinations.read().await.clone()
    }

    /// Look up a stored report by verification id.
    pub async fn report(&self, id: Uuid) -> ReportResult<VerificationRecord> {
        self.reports.load(id).await
    }

    pub async fn statistics(&self) -> EngineStatistics {
        let history = self.history.read().await;
        let count = |status: VerificationStatus| history.iter().filter(|r| r.status == status).count();
        let total = history.len();
        let passed = count(VerificationStatus::Passed);

        #[allow(clippy::cast_precision_loss)]
        let (pass_rate, average_confidence) = if total == 0 {
            (0.0, 0.0)
        } else {
            (
                passed as f64 / total as f64 * 100.0,
                history.iter().map(|r| r.confidence).sum::<f64>() / total as f64,
            )
        };

        EngineStatistics {
            total,
            passed,
            failed: count(VerificationStatus::Failed),
            errored: count(VerificationStatus::Error),
            pass_rate,
            average_confidence,
            hallucinations_detected: self.hallucinations.read().await.len(),
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Claim;
    use crate::infrastructure::process::{ScriptedCommandRunner, ScriptedResponse};
    use crate::infrastructure::InMemoryReportStore;
    use crate::services::checks::testing;
    use async_trait::async_trait;

    struct PanickingCheck;

    #[async_trait]
    impl Check for PanickingCheck {
        fn kind(&self) -> CheckKind {
            CheckKind::Existence
        }

        async fn run(&self, _task: &Task) -> anyhow::Result<CheckResult> {
            panic!("disk on fire")
        }
    }

    struct SlowCheck;

    #[async_trait]
    impl Check for SlowCheck {
        fn kind(&self) -> CheckKind {
            CheckKind::Tests
        }

        async fn run(&self, _task: &Task) -> anyhow::Result<CheckResult> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(CheckResult::scored(CheckKind::Tests, 15.0, vec![]))
        }
    }

    fn engine(
        runner: ScriptedCommandRunner,
    ) -> (tempfile::TempDir, VerificationEngine, Arc<InMemoryReportStore>) {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = Arc::new(InMemoryReportStore::new());
        let env = testing::env(dir.path(), Arc::new(runner));
        let engine = VerificationEngine::new(env, store.clone(), &EngineConfig::default());
        (dir, engine, store)
    }

    #[tokio::test]
    async fn test_hint_free_task_scores_full_marks() {
        let (_dir, engine, store) = engine(ScriptedCommandRunner::new());
        let outcome = engine.verify(&Task::new("Polish wording").with_id("t-1")).await;

        assert!(outcome.verified);
        assert!((outcome.confidence - 100.0).abs() < f64::EPSILON);
        for check in &outcome.record.checks {
            assert!((check.score - check.max_score).abs() < f64::EPSILON, "{}", check.name);
        }
        assert!(outcome.recommendations.is_empty());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_file_lowers_confidence() {
        let (_dir, engine, _store) = engine(ScriptedCommandRunner::new());
        let outcome = engine.verify(&Task::new("Implement src/foo.js").with_id("t-2")).await;

        let existence = outcome.record.check(CheckKind::Existence).expect("existence ran");
        assert!(existence.score.abs() < f64::EPSILON);
        assert!(!existence.passed);
        // existence 0/10 and tests 0/15 (no test for foo)
        assert!((outcome.confidence - 65.0 / 90.0 * 100.0).abs() < 1e-9);
        assert!(!outcome.verified);
        let critical = &outcome.recommendations[0];
        assert_eq!(critical.severity, crate::domain::models::Severity::Critical);
        assert_eq!(
            critical.details,
            vec![CheckDetail::File {
                path: "src/foo.js".into(),
                exists: false
            }]
        );
    }

    #[tokio::test]
    async fn test_errored_check_scores_zero_and_pipeline_continues() {
        let runner = ScriptedCommandRunner::new().with_rule("run-e2e", ScriptedResponse::SpawnError);
        let (_dir, engine, _store) = engine(runner);
        let outcome = engine
            .verify(&Task::new("x").with_id("t-3").with_test_command("run-e2e"))
            .await;

        let functionality = outcome.record.check(CheckKind::Functionality).expect("ran");
        assert!(functionality.error.is_some());
        assert!(functionality.score.abs() < f64::EPSILON);
        assert_eq!(outcome.record.checks.len(), 6);
        assert_eq!(outcome.record.status, VerificationStatus::Failed);
        assert!(outcome.recommendations[0].message.contains("failed to run"));
    }

    #[tokio::test]
    async fn test_panic_becomes_error_record() {
        let store = Arc::new(InMemoryReportStore::new());
        let engine = VerificationEngine::with_checks(
            vec![Box::new(PanickingCheck)],
            store.clone(),
            &EngineConfig::default(),
        );
        let outcome = engine.verify(&Task::new("x").with_id("t-4")).await;

        assert_eq!(outcome.record.status, VerificationStatus::Error);
        assert!(!outcome.verified);
        assert!(outcome.confidence.abs() < f64::EPSILON);
        assert!(outcome.record.error.as_deref().is_some_and(|e| e.contains("disk on fire")));
        assert_eq!(store.len().await, 1, "error records are reported too");
    }

    #[tokio::test]
    async fn test_check_timeout() {
        let config = EngineConfig {
            check_timeout_ms: 50,
            ..EngineConfig::default()
        };
        let engine = VerificationEngine::with_checks(
            vec![Box::new(SlowCheck)],
            Arc::new(InMemoryReportStore::new()),
            &config,
        );
        let outcome = engine.verify(&Task::new("x").with_id("t-5")).await;
        let check = &outcome.record.checks[0];
        assert!(check.error.as_deref().is_some_and(|e| e.contains("timed out")));
        assert_eq!(outcome.record.status, VerificationStatus::Failed);
    }

    #[tokio::test]
    async fn test_history_statistics_and_hallucination_log() {
        let (_dir, engine, _store) = engine(ScriptedCommandRunner::new());
        engine.verify(&Task::new("Polish").with_id("a")).await;
        let claim = Claim {
            description: "Zero latency".to_string(),
            impossible: true,
            ..Claim::default()
        };
        let outcome = engine.verify(&Task::new("Polish").with_id("b").with_claim(claim)).await;

        let stats = engine.statistics().await;
        assert_eq!(stats.total, 2);
        assert_eq!(stats.hallucinations_detected, 1);
        assert_eq!(engine.history_for("b").await.len(), 1);

        let log = engine.hallucination_log().await;
        assert_eq!(log[0].task_id, "b");
        assert_eq!(log[0].verification_id, outcome.record.id);

        let stored = engine.report(outcome.record.id).await.expect("stored");
        assert_eq!(stored.task_id, "b");
    }
}
