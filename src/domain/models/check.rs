//! Check result model.
//!
//! Each verification attempt runs the same six checks. A check produces a
//! [`CheckResult`] carrying its score, the evidence it looked at, and the
//! error that aborted it, if any.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The evaluation dimension a check covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Existence,
    Functionality,
    Tests,
    Integration,
    Hallucination,
    Performance,
}

impl CheckKind {
    /// Pipeline order.
    pub const ALL: [Self; 6] = [
        Self::Existence,
        Self::Functionality,
        Self::Tests,
        Self::Integration,
        Self::Hallucination,
        Self::Performance,
    ];

    /// Checks a queued task must clear.
    pub const REQUIRED: [Self; 4] = [
        Self::Existence,
        Self::Functionality,
        Self::Tests,
        Self::Integration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Existence => "existence",
            Self::Functionality => "functionality",
            Self::Tests => "tests",
            Self::Integration => "integration",
            Self::Hallucination => "hallucination",
            Self::Performance => "performance",
        }
    }

    /// Human-readable check name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Existence => "Existence Verification",
            Self::Functionality => "Functionality Verification",
            Self::Tests => "Test Coverage Verification",
            Self::Integration => "Integration Verification",
            Self::Hallucination => "Hallucination Detection",
            Self::Performance => "Performance Verification",
        }
    }

    pub fn max_score(&self) -> f64 {
        match self {
            Self::Existence | Self::Performance => 10.0,
            Self::Functionality | Self::Hallucination => 20.0,
            Self::Tests | Self::Integration => 15.0,
        }
    }

    /// Fraction of the max score needed to pass.
    pub fn pass_ratio(&self) -> f64 {
        match self {
            Self::Existence | Self::Integration => 0.6,
            Self::Functionality | Self::Performance => 0.7,
            Self::Tests => 0.5,
            Self::Hallucination => 1.0,
        }
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something suspicious found by the hallucination check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HallucinationFinding {
    ImpossibleClaim {
        claim: String,
        reason: Option<String>,
    },
    NonExistentReference {
        reference: String,
    },
    Contradiction {
        description: String,
    },
}

impl HallucinationFinding {
    /// Points deducted from the hallucination score.
    pub fn penalty(&self) -> f64 {
        match self {
            Self::ImpossibleClaim { .. } => 5.0,
            Self::NonExistentReference { .. } => 3.0,
            Self::Contradiction { .. } => 2.0,
        }
    }
}

/// Outcome of the lint step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LintOutcome {
    Passed,
    Failed { issues: Vec<String> },
    Skipped { reason: String },
}

/// One piece of evidence collected by a check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckDetail {
    File {
        path: PathBuf,
        exists: bool,
    },
    Directory {
        path: PathBuf,
        exists: bool,
    },
    TestCommand {
        command: String,
        passed: bool,
        output: String,
    },
    Endpoint {
        method: String,
        url: String,
        working: bool,
    },
    Behavior {
        name: String,
        passed: bool,
    },
    TestFiles {
        count: usize,
        files: Vec<PathBuf>,
    },
    TestRun {
        directory: PathBuf,
        passed: bool,
        error: Option<String>,
    },
    Build {
        success: bool,
        errors: Vec<String>,
    },
    Lint(LintOutcome),
    Hallucination(HallucinationFinding),
    Metric {
        name: String,
        threshold: f64,
        actual: f64,
        passed: bool,
    },
    /// A performance requirement whose measurement could not be taken.
    MeasurementFailed {
        name: String,
        error: String,
    },
    Note {
        message: String,
    },
}

impl CheckDetail {
    /// Whether this piece of evidence counts against the task.
    pub fn is_failure(&self) -> bool {
        match self {
            Self::File { exists, .. } | Self::Directory { exists, .. } => !exists,
            Self::TestCommand { passed, .. }
            | Self::Behavior { passed, .. }
            | Self::TestRun { passed, .. }
            | Self::Metric { passed, .. } => !passed,
            Self::Endpoint { working, .. } => !working,
            Self::TestFiles { count, .. } => *count == 0,
            Self::Build { success, .. } => !success,
            Self::Lint(outcome) => matches!(outcome, LintOutcome::Failed { .. }),
            Self::Hallucination(_) | Self::MeasurementFailed { .. } => true,
            Self::Note { .. } => false,
        }
    }

    pub fn note(message: impl Into<String>) -> Self {
        Self::Note {
            message: message.into(),
        }
    }
}

const SCORE_EPSILON: f64 = 1e-9;

/// Result of a single check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub kind: CheckKind,
    pub passed: bool,
    pub score: f64,
    pub max_score: f64,
    pub details: Vec<CheckDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    /// Build a result from a raw score, clamping it into `0..=max_score` and
    /// deciding the verdict from the kind's pass ratio.
    pub fn scored(kind: CheckKind, score: f64, details: Vec<CheckDetail>) -> Self {
        let max_score = kind.max_score();
        let score = if score.is_finite() {
            score.clamp(0.0, max_score)
        } else {
            0.0
        };
        Self {
            name: kind.display_name().to_string(),
            kind,
            passed: score + SCORE_EPSILON >= max_score * kind.pass_ratio(),
            score,
            max_score,
            details,
            error: None,
        }
    }

    /// A check that could not complete. Scores zero.
    pub fn errored(kind: CheckKind, error: impl Into<String>) -> Self {
        Self {
            name: kind.display_name().to_string(),
            kind,
            passed: false,
            score: 0.0,
            max_score: kind.max_score(),
            details: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Override the verdict while keeping the score.
    pub fn with_passed(mut self, passed: bool) -> Self {
        self.passed = passed;
        self
    }

    /// Details that count against the task.
    pub fn failing_details(&self) -> Vec<CheckDetail> {
        self.details
            .iter()
            .filter(|d| d.is_failure())
            .cloned()
            .collect()
    }
}

/// Accumulates weighted evidence for a check and converts it to a score.
///
/// The score is `max_score * earned / applicable`. With no applicable
/// evidence the check has nothing to contradict the claim and gets full
/// marks.
#[derive(Debug, Default)]
pub struct WeightedScore {
    earned: f64,
    applicable: f64,
}

impl WeightedScore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one piece of evidence worth `weight` points.
    pub fn record(&mut self, weight: f64, satisfied: bool) {
        self.applicable += weight;
        if satisfied {
            self.earned += weight;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.applicable <= 0.0
    }

    pub fn score(&self, max_score: f64) -> f64 {
        if self.is_empty() {
            max_score
        } else {
            max_score * self.earned / self.applicable
        }
    }
}
