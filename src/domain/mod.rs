//! Domain layer for Taskgate
//!
//! This module contains the verification models, domain errors and the port
//! traits that infrastructure adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{CommandError, GateError, ReportError};
