//! Verification report storage.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{ReportError, ReportResult};
use crate::domain::models::VerificationRecord;
use crate::domain::ports::ReportStore;

/// Writes each record as pretty JSON to `<dir>/verification-<id>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileReportStore {
    dir: PathBuf,
}

impl JsonFileReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("verification-{id}.json"))
    }
}

#[async_trait]
impl ReportStore for JsonFileReportStore {
    async fn save(&self, record: &VerificationRecord) -> ReportResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ReportError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.path_for(record.id);
        let body = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| ReportError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(verification_id = %record.id, path = %path.display(), "Report written");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> ReportResult<VerificationRecord> {
        let path = self.path_for(id);
        let body = match tokio::fs::read_to_string(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReportError::NotFound(id));
            }
            Err(source) => return Err(ReportError::Io { path, source }),
        };
        Ok(serde_json::from_str(&body)?)
    }
}

/// Keeps reports in memory. Used in tests and when persistence is not wanted.
#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    reports: RwLock<HashMap<Uuid, VerificationRecord>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.reports.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.reports.read().await.is_empty()
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn save(&self, record: &VerificationRecord) -> ReportResult<()> {
        self.reports.write().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, id: Uuid) -> ReportResult<VerificationRecord> {
        self.reports
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ReportError::NotFound(id))
    }
}
