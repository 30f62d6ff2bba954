//! EventBus service for verification lifecycle events.
//!
//! Provides a broadcast-based event system with sequence numbering. Events
//! carry the stable names subscribers match on (`task:queued`,
//! `verification:success`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::models::{RecommendedAction, Recommendation};

/// Monotonically increasing sequence number assigned by EventBus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceNumber(pub u64);

impl std::fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle event emitted by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum VerificationEvent {
    TaskQueued {
        task_id: String,
        queue_length: usize,
    },
    VerificationStarted {
        task_id: String,
        attempt: u32,
        max_attempts: u32,
    },
    VerificationSucceeded {
        task_id: String,
        verification_id: Uuid,
        confidence: f64,
        attempts: u32,
    },
    VerificationFailed {
        task_id: String,
        verification_id: Uuid,
        confidence: f64,
        attempts: u32,
        issues: Vec<Recommendation>,
    },
    VerificationErrored {
        task_id: String,
        error: String,
    },
    TaskBlocked {
        task_id: String,
        reason: String,
        recommendations: Vec<Recommendation>,
    },
    TaskUnblocked {
        task_id: String,
    },
    AutoFixApplied {
        task_id: String,
        action: RecommendedAction,
        summary: String,
    },
    AutoFixFailed {
        task_id: String,
        action: RecommendedAction,
        error: String,
    },
    QueueProcessed {
        processed: usize,
    },
}

impl VerificationEvent {
    /// Stable event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TaskQueued { .. } => "task:queued",
            Self::VerificationStarted { .. } => "verification:start",
            Self::VerificationSucceeded { .. } => "verification:success",
            Self::VerificationFailed { .. } => "verification:failed",
            Self::VerificationErrored { .. } => "verification:error",
            Self::TaskBlocked { .. } => "task:blocked",
            Self::TaskUnblocked { .. } => "task:unblocked",
            Self::AutoFixApplied { .. } => "autofix:applied",
            Self::AutoFixFailed { .. } => "autofix:failed",
            Self::QueueProcessed { .. } => "queue:processed",
        }
    }

    /// Task the event concerns, if any.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::TaskQueued { task_id, .. }
            | Self::VerificationStarted { task_id, .. }
            | Self::VerificationSucceeded { task_id, .. }
            | Self::VerificationFailed { task_id, .. }
            | Self::VerificationErrored { task_id, .. }
            | Self::TaskBlocked { task_id, .. }
            | Self::TaskUnblocked { task_id }
            | Self::AutoFixApplied { task_id, .. }
            | Self::AutoFixFailed { task_id, .. } => Some(task_id),
            Self::QueueProcessed { .. } => None,
        }
    }
}

/// Event envelope with bus-assigned metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub sequence: SequenceNumber,
    pub timestamp: DateTime<Utc>,
    pub event: VerificationEvent,
}

impl EventEnvelope {
    pub fn name(&self) -> &'static str {
        self.event.name()
    }
}

/// Configuration for the EventBus.
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Channel capacity for the broadcast channel.
    pub channel_capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// Central event bus for broadcasting events to multiple consumers.
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
    sequence: AtomicU64,
}

impl EventBus {
    /// Create a new EventBus with the given configuration.
    pub fn new(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity);
        Self {
            sender,
            sequence: AtomicU64::new(0),
        }
    }

    /// Publish an event, returning the envelope that was broadcast.
    pub fn publish(&self, event: VerificationEvent) -> EventEnvelope {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            id: Uuid::new_v4(),
            sequence: SequenceNumber(seq),
            timestamp: Utc::now(),
            event,
        };

        tracing::trace!(
            event = envelope.name(),
            sequence = seq,
            task_id = envelope.event.task_id().unwrap_or_default(),
            "event published"
        );

        // No subscribers is not an error.
        let _ = self.sender.send(envelope.clone());
        envelope
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Get the current sequence number.
    pub fn current_sequence(&self) -> SequenceNumber {
        SequenceNumber(self.sequence.load(Ordering::SeqCst))
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}
