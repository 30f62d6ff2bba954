//! Verification record model.
//!
//! A [`RunningVerification`] is opened at the start of an attempt and sealed
//! into an immutable [`VerificationRecord`] once its status is known.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::check::{CheckDetail, CheckKind, CheckResult};

/// Status of a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Running,
    Passed,
    Failed,
    Error,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a recommendation, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
}

impl Severity {
    fn rank(self) -> u8 {
        match self {
            Self::Critical => 3,
            Self::High => 2,
            Self::Medium => 1,
        }
    }

    /// Whether `self` is at least as severe as `floor`.
    pub fn at_least(self, floor: Self) -> bool {
        self.rank() >= floor.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Suggested remediation for a failed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    CreateMissingResources,
    FixImplementation,
    AddTests,
    FixBuildAndLint,
    ResolveHallucinations,
    OptimizePerformance,
}

impl RecommendedAction {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::CreateMissingResources => "Create missing resources or update task description",
            Self::FixImplementation => "Debug and fix implementation",
            Self::AddTests => "Add comprehensive tests for the feature",
            Self::FixBuildAndLint => "Fix build/lint errors before marking complete",
            Self::ResolveHallucinations => "Verify claims and fix discrepancies",
            Self::OptimizePerformance => "Optimize implementation",
        }
    }
}

/// Actionable hint derived from one failed check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub severity: Severity,
    pub check: CheckKind,
    pub message: String,
    pub action: RecommendedAction,
    pub details: Vec<CheckDetail>,
}

impl Recommendation {
    /// Build the recommendation for a failed check, keeping only its failing
    /// details.
    pub fn for_failed_check(check: &CheckResult) -> Self {
        let (severity, message, action) = match check.kind {
            CheckKind::Existence => (
                Severity::Critical,
                "Missing files or directories detected",
                RecommendedAction::CreateMissingResources,
            ),
            CheckKind::Functionality => (
                Severity::High,
                "Feature not working as expected",
                RecommendedAction::FixImplementation,
            ),
            CheckKind::Tests => (
                Severity::Medium,
                "Insufficient test coverage",
                RecommendedAction::AddTests,
            ),
            CheckKind::Integration => (
                Severity::High,
                "Integration issues detected",
                RecommendedAction::FixBuildAndLint,
            ),
            CheckKind::Hallucination => (
                Severity::Critical,
                "Potential hallucinations detected",
                RecommendedAction::ResolveHallucinations,
            ),
            CheckKind::Performance => (
                Severity::Medium,
                "Performance requirements not met",
                RecommendedAction::OptimizePerformance,
            ),
        };

        let message = match &check.error {
            Some(error) => format!("{message} ({} failed to run: {error})", check.kind),
            None => message.to_string(),
        };

        Self {
            severity,
            check: check.kind,
            message,
            action,
            details: check.failing_details(),
        }
    }
}

/// Derive recommendations from a list of checks: one per failed check, in
/// pipeline order.
pub fn recommendations_for(checks: &[CheckResult]) -> Vec<Recommendation> {
    checks
        .iter()
        .filter(|c| !c.passed)
        .map(Recommendation::for_failed_check)
        .collect()
}

/// A verification attempt in progress.
#[derive(Debug, Clone)]
pub struct RunningVerification {
    id: Uuid,
    task_id: String,
    started_at: DateTime<Utc>,
}

impl RunningVerification {
    pub fn start(task_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id: task_id.into(),
            started_at: Utc::now(),
        }
    }

    pub const fn id(&self) -> Uuid {
        self.id
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub const fn status(&self) -> VerificationStatus {
        VerificationStatus::Running
    }

    /// Seal the attempt with the completed checks.
    pub fn complete(self, checks: Vec<CheckResult>, threshold: f64) -> VerificationRecord {
        let confidence = confidence_of(&checks);
        let passed = confidence >= threshold;
        let recommendations = recommendations_for(&checks);
        self.seal(
            if passed {
                VerificationStatus::Passed
            } else {
                VerificationStatus::Failed
            },
            checks,
            confidence,
            passed,
            recommendations,
            None,
        )
    }

    /// Seal the attempt after the pipeline itself failed.
    pub fn fail(self, checks: Vec<CheckResult>, error: impl Into<String>) -> VerificationRecord {
        self.seal(
            VerificationStatus::Error,
            checks,
            0.0,
            false,
            Vec::new(),
            Some(error.into()),
        )
    }

    fn seal(
        self,
        status: VerificationStatus,
        checks: Vec<CheckResult>,
        confidence: f64,
        passed: bool,
        recommendations: Vec<Recommendation>,
        error: Option<String>,
    ) -> VerificationRecord {
        let finished_at = Utc::now();
        let duration_ms = u64::try_from((finished_at - self.started_at).num_milliseconds()).unwrap_or(0);
        VerificationRecord {
            id: self.id,
            task_id: self.task_id,
            started_at: self.started_at,
            finished_at,
            duration_ms,
            status,
            checks,
            confidence,
            passed,
            recommendations,
            error,
        }
    }
}

/// Confidence as a percentage of the achievable score.
pub fn confidence_of(checks: &[CheckResult]) -> f64 {
    let score: f64 = checks.iter().map(|c| c.score).sum();
    let max: f64 = checks.iter().map(|c| c.max_score).sum();
    if max <= 0.0 {
        return 0.0;
    }
    (score / max * 100.0).clamp(0.0, 100.0)
}

/// Immutable result of one verification attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub id: Uuid,
    pub task_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub status: VerificationStatus,
    pub checks: Vec<CheckResult>,
    pub confidence: f64,
    pub passed: bool,
    pub recommendations: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationRecord {
    pub fn check(&self, kind: CheckKind) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.kind == kind)
    }
}

/// What the engine hands back for one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub verified: bool,
    pub confidence: f64,
    pub record: VerificationRecord,
    pub recommendations: Vec<Recommendation>,
}

impl From<VerificationRecord> for VerificationOutcome {
    fn from(record: VerificationRecord) -> Self {
        Self {
            verified: record.passed,
            confidence: record.confidence,
            recommendations: record.recommendations.clone(),
            record,
        }
    }
}
