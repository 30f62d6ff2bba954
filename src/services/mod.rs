//! Service layer: the verification pipeline and everything that drives it.
//!
//! - `checks`: the six checks and the environment they share
//! - `verification_engine`: runs the checks and seals a record
//! - `auto_fix`: remediation between attempts
//! - `verification_orchestrator`: queue, retries, blocked set
//! - `event_bus`: lifecycle events

pub mod auto_fix;
pub mod checks;
pub mod event_bus;
pub mod verification_engine;
pub mod verification_orchestrator;

pub use auto_fix::{AutoFixer, Remediation};
pub use checks::{standard_checks, Check, CheckEnv};
pub use event_bus::{EventBus, EventBusConfig, EventEnvelope, SequenceNumber, VerificationEvent};
pub use verification_engine::{EngineStatistics, HallucinationRecord, VerificationEngine};
pub use verification_orchestrator::{
    BlockedTask, OrchestratorStatistics, TaskOutcome, TaskVerdict, TaskVerificationStatus,
    VerificationOrchestrator,
};
