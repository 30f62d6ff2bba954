use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::Recommendation;

/// Proof of a passing verification handed to the task manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionReceipt {
    pub verification_id: Uuid,
    pub confidence: f64,
    pub verified_at: DateTime<Utc>,
}

/// Why a task stays pending after its retries ran out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingNotice {
    pub issues: Vec<Recommendation>,
    pub last_verification_id: Uuid,
}

/// The task-management system that owns task status.
///
/// Notifications are best effort: an error here is logged and never rolls
/// back the orchestrator's own state.
#[async_trait]
pub trait TaskLifecycle: Send + Sync {
    async fn mark_complete(&self, task_id: &str, receipt: CompletionReceipt) -> Result<()>;

    async fn mark_pending(&self, task_id: &str, notice: PendingNotice) -> Result<()>;
}
