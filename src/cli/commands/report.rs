use anyhow::{Context, Result};
use uuid::Uuid;

use crate::cli::display::{output, ReportView};
use crate::domain::models::Config;
use crate::domain::ports::ReportStore;
use crate::infrastructure::JsonFileReportStore;

/// Print a stored verification report.
pub async fn execute(verification_id: Uuid, config: &Config, json: bool) -> Result<()> {
    let store = JsonFileReportStore::new(&config.reports.directory);
    let record = store
        .load(verification_id)
        .await
        .with_context(|| format!("Failed to load report from {}", store.dir().display()))?;
    output(&ReportView::new(record), json);
    Ok(())
}
