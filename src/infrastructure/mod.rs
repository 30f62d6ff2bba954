//! Infrastructure layer module
//!
//! Adapters satisfying the port traits defined in the domain layer:
//! - Local filesystem access
//! - External process execution and timing
//! - HTTP endpoint probing
//! - Report storage
//! - Configuration management
//! - Logging infrastructure

pub mod config;
pub mod filesystem;
pub mod http;
pub mod logging;
pub mod process;
pub mod reports;

pub use filesystem::LocalFileSystem;
pub use http::HttpEndpointProber;
pub use process::{CommandTimingProbe, TokioCommandRunner};
pub use reports::{InMemoryReportStore, JsonFileReportStore};
