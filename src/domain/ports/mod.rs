//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that infrastructure adapters must implement:
//! - CommandRunner: test, build, lint and search invocations
//! - FileSystem: existence checks, test discovery, placeholder writes
//! - EndpointProber / PerformanceProbe: live evidence
//! - ReportStore: durable verification reports
//! - TaskLifecycle: callbacks into the task-management system
//!
//! These traits define the contracts that keep the verification services
//! independent of specific infrastructure implementations.

pub mod command_runner;
pub mod filesystem;
pub mod probes;
pub mod report_store;
pub mod task_lifecycle;

pub use command_runner::{CommandOutput, CommandRunner, CommandSpec};
pub use filesystem::FileSystem;
pub use probes::{EndpointProber, PerformanceProbe};
pub use report_store::ReportStore;
pub use task_lifecycle::{CompletionReceipt, PendingNotice, TaskLifecycle};
