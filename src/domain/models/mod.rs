pub mod check;
pub mod config;
pub mod record;
pub mod task;

pub use check::{
    CheckDetail, CheckKind, CheckResult, HallucinationFinding, LintOutcome, WeightedScore,
};
pub use config::{
    CommandsConfig, Config, EngineConfig, LoggingConfig, OrchestratorConfig, ReportConfig,
};
pub use record::{
    confidence_of, recommendations_for, Recommendation, RecommendedAction, RunningVerification,
    Severity, VerificationOutcome, VerificationRecord, VerificationStatus,
};
pub use task::{
    generate_task_id, Behavior, Claim, Endpoint, PerformanceRequirement, Task,
    VerificationMetadata,
};
