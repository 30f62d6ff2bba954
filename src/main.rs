//! Taskgate CLI entry point.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use taskgate::cli::{commands, handle_error, Cli, Commands};
use taskgate::infrastructure::logging::{LogConfig, LoggerImpl};
use taskgate::ConfigLoader;

/// Exit code for a task the gate rejected.
const REJECTED: u8 = 1;
/// Exit code for a command that could not run.
const FAILED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(REJECTED),
        Err(err) => {
            handle_error(&err, cli.json);
            ExitCode::from(FAILED)
        }
    }
}

async fn run(cli: &Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let _logger = LoggerImpl::init(&LogConfig::try_from(&config.logging)?)?;

    match &cli.command {
        Commands::Verify { task_file } => commands::verify::execute(task_file, &config, cli.json).await,
        Commands::Report { verification_id } => {
            commands::report::execute(*verification_id, &config, cli.json).await?;
            Ok(true)
        }
        Commands::Config => {
            commands::config::execute(&config, cli.json)?;
            Ok(true)
        }
    }
}
