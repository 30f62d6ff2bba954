use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::ReportResult;
use crate::domain::models::VerificationRecord;

/// Durable storage for verification reports, one per attempt, keyed by the
/// record identifier.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn save(&self, record: &VerificationRecord) -> ReportResult<()>;

    async fn load(&self, id: Uuid) -> ReportResult<VerificationRecord>;
}
