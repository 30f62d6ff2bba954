//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "taskgate")]
#[command(about = "Taskgate - verify agent tasks before they are marked complete", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to .taskgate/config.yaml and .taskgate/local.yaml)
    #[arg(short, long, global = true, env = "TASKGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify a task file and gate its completion
    Verify {
        /// Task definition (YAML or JSON)
        task_file: PathBuf,
    },

    /// Show a stored verification report
    Report {
        /// Verification ID
        verification_id: Uuid,
    },

    /// Print the effective configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verify_with_global_flags() {
        let cli = Cli::try_parse_from(["taskgate", "verify", "task.yaml", "--json", "-c", "gate.yaml"])
            .expect("parses");
        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("gate.yaml")));
        assert!(matches!(cli.command, Commands::Verify { task_file } if task_file == PathBuf::from("task.yaml")));
    }

    #[test]
    fn test_report_requires_uuid() {
        assert!(Cli::try_parse_from(["taskgate", "report", "not-a-uuid"]).is_err());
    }
}
