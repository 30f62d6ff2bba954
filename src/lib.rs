//! Taskgate - completion gate for agent-produced work
//!
//! Taskgate decides whether a task that claims to be done actually is. A
//! verification engine gathers evidence (files on disk, test and build runs,
//! live endpoints, claims in the description) and scores it; an orchestrator
//! queues tasks, retries failures after automatic remediation, and blocks the
//! tasks that never pass.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and port traits
//! - **Service Layer** (`services`): checks, engine, auto-fix, orchestrator, events
//! - **Infrastructure Layer** (`infrastructure`): filesystem, processes, HTTP,
//!   reports, configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use taskgate::cli::service::VerificationService;
//! use taskgate::{ConfigLoader, Task};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let service = VerificationService::from_config(&config)?;
//!     let outcome = service
//!         .orchestrator()
//!         .force_verify(Task::new("Add src/parser.rs").with_test_command("cargo test parser"))
//!         .await;
//!     println!("{:.2}%", outcome.confidence);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{CommandError, GateError, ReportError};
pub use domain::models::{
    CheckDetail, CheckKind, CheckResult, Config, Recommendation, Severity, Task,
    VerificationOutcome, VerificationRecord, VerificationStatus,
};
pub use domain::ports::{CommandRunner, FileSystem, ReportStore, TaskLifecycle};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{EventBus, VerificationEngine, VerificationEvent, VerificationOrchestrator};
