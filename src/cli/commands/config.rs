use anyhow::{Context, Result};

use crate::domain::models::Config;

/// Print the effective configuration.
pub fn execute(config: &Config, json: bool) -> Result<()> {
    let rendered = if json {
        serde_json::to_string_pretty(config).context("Failed to serialize configuration")?
    } else {
        serde_yaml::to_string(config).context("Failed to serialize configuration")?
    };
    println!("{rendered}");
    Ok(())
}
