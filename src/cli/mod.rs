//! Command-line interface.

pub mod commands;
pub mod display;
pub mod service;
pub mod types;

pub use types::{Cli, Commands};

/// Print a command error in the selected format.
pub fn handle_error(err: &anyhow::Error, json: bool) {
    if json {
        let body = serde_json::json!({ "error": format!("{err:#}") });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
}
