//! Verification Orchestrator.
//!
//! Owns the pending queue, the per-task results and the blocked set. Tasks
//! are drained one at a time in FIFO order; each runs the retry procedure
//! (verify, auto-fix, back off, verify again) to completion before the next
//! one is popped. `force_verify` shares the same verification slot, so two
//! retry procedures never run at once.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::domain::errors::GateError;
use crate::domain::models::{OrchestratorConfig, Recommendation, Task, VerificationOutcome};
use crate::domain::ports::{CompletionReceipt, PendingNotice, TaskLifecycle};
use crate::services::auto_fix::{AutoFixer, Remediation};
use crate::services::event_bus::{EventBus, EventEnvelope, VerificationEvent};
use crate::services::verification_engine::{panic_message, EngineStatistics, VerificationEngine};

const BLOCKED_REASON: &str = "Verification failed";

/// Final verdict of a retry procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskVerdict {
    Verified,
    Failed,
}

/// Last recorded result for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub verdict: TaskVerdict,
    pub outcome: VerificationOutcome,
    pub timestamp: DateTime<Utc>,
}

/// Answer to a status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskVerificationStatus {
    pub task_id: String,
    pub verified: bool,
    pub blocked: bool,
    pub result: Option<VerificationOutcome>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// A task held back after exhausting its retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedTask {
    pub task_id: String,
    pub reason: String,
    pub recommendations: Vec<Recommendation>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorStatistics {
    pub queued: usize,
    pub total_processed: usize,
    pub verified: usize,
    pub failed: usize,
    pub blocked: usize,
    /// Percentage of processed tasks that ended verified.
    pub verification_rate: f64,
    pub engine: EngineStatistics,
}

#[derive(Default)]
struct OrchestratorState {
    queue: VecDeque<Task>,
    results: HashMap<String, TaskOutcome>,
    blocked: BTreeSet<String>,
}

pub struct VerificationOrchestrator {
    engine: Arc<VerificationEngine>,
    fixer: AutoFixer,
    events: Arc<EventBus>,
    lifecycle: Option<Arc<dyn TaskLifecycle>>,
    config: OrchestratorConfig,
    state: RwLock<OrchestratorState>,
    draining: AtomicBool,
    verification_slot: Mutex<()>,
}

impl VerificationOrchestrator {
    pub fn new(
        engine: Arc<VerificationEngine>,
        fixer: AutoFixer,
        events: Arc<EventBus>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            engine,
            fixer,
            events,
            lifecycle: None,
            config,
            state: RwLock::new(OrchestratorState::default()),
            draining: AtomicBool::new(false),
            verification_slot: Mutex::new(()),
        }
    }

    /// Notify a task-management system of final verdicts.
    pub fn with_lifecycle(mut self, lifecycle: Arc<dyn TaskLifecycle>) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    pub fn engine(&self) -> &Arc<VerificationEngine> {
        &self.engine
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    /// Enqueue a task, returning its (possibly assigned) identifier.
    ///
    /// With `auto_verify` on, a drain is spawned unless one is already
    /// running.
    pub async fn queue_task_for_verification(self: &Arc<Self>, task: Task) -> String {
        let task = task.enrich();
        let task_id = task.id.clone();

        let queue_length = {
            let mut state = self.state.write().await;
            state.queue.push_back(task);
            state.queue.len()
        };
        tracing::info!(task_id = %task_id, queue_length, "Task queued for verification");
        self.events.publish(VerificationEvent::TaskQueued {
            task_id: task_id.clone(),
            queue_length,
        });

        if self.config.auto_verify && !self.draining.load(Ordering::Acquire) {
            let orchestrator = Arc::clone(self);
            tokio::spawn(async move {
                orchestrator.process_queue().await;
            });
        }

        task_id
    }

    /// Drain the queue, returning how many tasks this call processed.
    ///
    /// A call while another drain is active returns 0 immediately.
    /// `queue:processed` is only published when at least one task ran.
    pub async fn process_queue(&self) -> usize {
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Drain already in progress");
            return 0;
        }

        let mut processed = 0;
        loop {
            let next = self.state.write().await.queue.pop_front();
            if let Some(task) = next {
                self.process_task(task).await;
                processed += 1;
                continue;
            }

            self.draining.store(false, Ordering::Release);
            // A task queued between the pop and the reset found the flag set
            // and spawned nothing; pick it up here.
            let refilled = !self.state.read().await.queue.is_empty();
            if !refilled
                || self
                    .draining
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
            {
                break;
            }
        }

        if processed == 0 {
            return 0;
        }
        tracing::info!(processed, "Verification queue drained");
        self.events
            .publish(VerificationEvent::QueueProcessed { processed });
        processed
    }

    async fn process_task(&self, task: Task) {
        let task_id = task.id.clone();
        if let Err(panic) = AssertUnwindSafe(self.verify_with_retries(task))
            .catch_unwind()
            .await
        {
            let error = panic_message(panic.as_ref());
            tracing::error!(task_id = %task_id, error = %error, "Task verification panicked");
            self.events
                .publish(VerificationEvent::VerificationErrored { task_id, error });
        }
    }

    /// Run the retry procedure now, outside the queue.
    pub async fn force_verify(&self, task: Task) -> VerificationOutcome {
        let task = if task.verification.is_some() && !task.id.trim().is_empty() {
            task
        } else {
            task.enrich()
        };
        self.verify_with_retries(task).await
    }

    /// Verify a task that is about to be marked complete.
    ///
    /// With `strict_completion` on, a task that ends unverified is rejected
    /// with its confidence and the messages of its recommendations.
    pub async fn verify_for_completion(&self, task: Task) -> Result<VerificationOutcome, GateError> {
        let outcome = self.force_verify(task).await;
        if self.config.strict_completion && !self.is_success(&outcome) {
            return Err(GateError::CompletionRejected {
                task_id: outcome.record.task_id.clone(),
                confidence: outcome.confidence,
                issues: outcome
                    .recommendations
                    .iter()
                    .map(|r| r.message.clone())
                    .collect(),
            });
        }
        Ok(outcome)
    }

    fn is_success(&self, outcome: &VerificationOutcome) -> bool {
        outcome.verified && outcome.confidence >= self.config.verification_threshold
    }

    async fn verify_with_retries(&self, task: Task) -> VerificationOutcome {
        let _slot = self.verification_slot.lock().await;
        let max_attempts = self.config.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::info!(task_id = %task.id, attempt, max_attempts, "Verification attempt");
            self.events.publish(VerificationEvent::VerificationStarted {
                task_id: task.id.clone(),
                attempt,
                max_attempts,
            });

            let outcome = self.engine.verify(&task).await;

            if self.is_success(&outcome) {
                self.record_success(&task, &outcome, attempt).await;
                return outcome;
            }

            if attempt < max_attempts && self.config.retry_on_failure {
                tracing::info!(
                    task_id = %task.id,
                    attempt,
                    confidence = outcome.confidence,
                    "Verification below threshold, retrying"
                );
                self.auto_fix(&task, &outcome).await;
                let backoff = self.config.retry_backoff_ms.saturating_mul(u64::from(attempt));
                tokio::time::sleep(Duration::from_millis(backoff)).await;
                continue;
            }

            self.record_failure(&task, &outcome, attempt).await;
            return outcome;
        }
    }

    async fn auto_fix(&self, task: &Task, outcome: &VerificationOutcome) {
        let floor = self.config.auto_fix_min_severity;
        for recommendation in outcome
            .recommendations
            .iter()
            .filter(|r| r.severity.at_least(floor))
        {
            let action = recommendation.action;
            let remediation = Remediation::for_recommendation(recommendation);
            match self.fixer.apply(&remediation, &task.description).await {
                Ok(summary) => {
                    tracing::info!(task_id = %task.id, ?action, summary = %summary, "Auto-fix applied");
                    self.events.publish(VerificationEvent::AutoFixApplied {
                        task_id: task.id.clone(),
                        action,
                        summary,
                    });
                }
                Err(e) => {
                    tracing::warn!(task_id = %task.id, ?action, error = %e, "Auto-fix failed");
                    self.events.publish(VerificationEvent::AutoFixFailed {
                        task_id: task.id.clone(),
                        action,
                        error: format!("{e:#}"),
                    });
                }
            }
        }
    }

    async fn record_success(&self, task: &Task, outcome: &VerificationOutcome, attempts: u32) {
        let now = Utc::now();
        {
            let mut state = self.state.write().await;
            state.results.insert(
                task.id.clone(),
                TaskOutcome {
                    verdict: TaskVerdict::Verified,
                    outcome: outcome.clone(),
                    timestamp: now,
                },
            );
            state.blocked.remove(&task.id);
        }

        tracing::info!(
            task_id = %task.id,
            verification_id = %outcome.record.id,
            confidence = outcome.confidence,
            attempts,
            "Task verified"
        );

        if let Some(lifecycle) = &self.lifecycle {
            let receipt = CompletionReceipt {
                verification_id: outcome.record.id,
                confidence: outcome.confidence,
                verified_at: now,
            };
            if let Err(e) = lifecycle.mark_complete(&task.id, receipt).await {
                tracing::warn!(task_id = %task.id, error = %e, "Failed to mark task complete");
            }
        }

        self.events.publish(VerificationEvent::VerificationSucceeded {
            task_id: task.id.clone(),
            verification_id: outcome.record.id,
            confidence: outcome.confidence,
            attempts,
        });
    }

    async fn record_failure(&self, task: &Task, outcome: &VerificationOutcome, attempts: u32) {
        let blocked = {
            let mut state = self.state.write().await;
            state.results.insert(
                task.id.clone(),
                TaskOutcome {
                    verdict: TaskVerdict::Failed,
                    outcome: outcome.clone(),
                    timestamp: Utc::now(),
                },
            );
            if self.config.block_on_failure {
                state.blocked.insert(task.id.clone());
            }
            self.config.block_on_failure
        };

        tracing::warn!(
            task_id = %task.id,
            verification_id = %outcome.record.id,
            confidence = outcome.confidence,
            attempts,
            blocked,
            "Task failed verification"
        );

        if let Some(lifecycle) = &self.lifecycle {
            let notice = PendingNotice {
                issues: outcome.recommendations.clone(),
                last_verification_id: outcome.record.id,
            };
            if let Err(e) = lifecycle.mark_pending(&task.id, notice).await {
                tracing::warn!(task_id = %task.id, error = %e, "Failed to mark task pending");
            }
        }

        self.events.publish(VerificationEvent::VerificationFailed {
            task_id: task.id.clone(),
            verification_id: outcome.record.id,
            confidence: outcome.confidence,
            attempts,
            issues: outcome.recommendations.clone(),
        });
        if blocked {
            self.events.publish(VerificationEvent::TaskBlocked {
                task_id: task.id.clone(),
                reason: BLOCKED_REASON.to_string(),
                recommendations: outcome.recommendations.clone(),
            });
        }
    }

    pub async fn get_verification_status(&self, task_id: &str) -> TaskVerificationStatus {
        let state = self.state.read().await;
        let result = state.results.get(task_id);
        TaskVerificationStatus {
            task_id: task_id.to_string(),
            verified: result.is_some_and(|r| r.verdict == TaskVerdict::Verified),
            blocked: state.blocked.contains(task_id),
            result: result.map(|r| r.outcome.clone()),
            timestamp: result.map(|r| r.timestamp),
        }
    }

    /// Blocked tasks with their last recommendations, ordered by id.
    pub async fn get_blocked_tasks(&self) -> Vec<BlockedTask> {
        let state = self.state.read().await;
        state
            .blocked
            .iter()
            .map(|task_id| {
                let result = state.results.get(task_id);
                BlockedTask {
                    task_id: task_id.clone(),
                    reason: BLOCKED_REASON.to_string(),
                    recommendations: result
                        .map(|r| r.outcome.recommendations.clone())
                        .unwrap_or_default(),
                    timestamp: result.map(|r| r.timestamp),
                }
            })
            .collect()
    }

    /// Remove a task from the blocked set. Its last result is kept as is.
    ///
    /// Returns whether the task was blocked.
    pub async fn unblock_task(&self, task_id: &str) -> bool {
        let was_blocked = self.state.write().await.blocked.remove(task_id);
        if was_blocked {
            tracing::info!(task_id, "Task unblocked");
            self.events.publish(VerificationEvent::TaskUnblocked {
                task_id: task_id.to_string(),
            });
        }
        was_blocked
    }

    pub async fn statistics(&self) -> OrchestratorStatistics {
        let (queued, total_processed, verified, blocked) = {
            let state = self.state.read().await;
            let verified = state
                .results
                .values()
                .filter(|r| r.verdict == TaskVerdict::Verified)
                .count();
            (state.queue.len(), state.results.len(), verified, state.blocked.len())
        };

        #[allow(clippy::cast_precision_loss)]
        let verification_rate = if total_processed == 0 {
            0.0
        } else {
            verified as f64 / total_processed as f64 * 100.0
        };

        OrchestratorStatistics {
            queued,
            total_processed,
            verified,
            failed: total_processed - verified,
            blocked,
            verification_rate,
            engine: self.engine.statistics().await,
        }
    }

    /// Forget queued tasks, results and the blocked set.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.queue.clear();
        state.results.clear();
        state.blocked.clear();
        tracing::info!("Orchestrator state reset");
    }
}
