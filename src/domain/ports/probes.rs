//! Ports for live evidence: HTTP endpoints and performance metrics.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::{Endpoint, PerformanceRequirement};

/// Probes a declared endpoint.
#[async_trait]
pub trait EndpointProber: Send + Sync {
    /// `true` when the endpoint answered with a success status. Connection
    /// failures and timeouts are `false`.
    async fn probe(&self, endpoint: &Endpoint) -> bool;
}

/// Measures the metric named by a performance requirement.
#[async_trait]
pub trait PerformanceProbe: Send + Sync {
    async fn measure(&self, requirement: &PerformanceRequirement) -> Result<f64>;
}
