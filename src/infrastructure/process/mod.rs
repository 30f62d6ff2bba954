//! External process adapters
//!
//! - Command runner with per-invocation timeouts
//! - Performance measurement by command timing
//! - Scripted runner for tests

pub mod runner;
pub mod scripted;
pub mod timing;

pub use runner::TokioCommandRunner;
pub use scripted::{ScriptedCommandRunner, ScriptedResponse};
pub use timing::CommandTimingProbe;
