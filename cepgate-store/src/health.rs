//! Health reporting shared by the tier backends

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};

/// Health status of a single backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Backend is responsive
    Healthy,
    /// Backend answered, but slower than the degraded threshold
    Degraded,
    /// Backend is not responsive or erroring
    Unhealthy,
}

impl HealthStatus {
    /// Healthy or degraded
    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
    }
}

/// Result of probing one backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub backend: String,
    pub status: HealthStatus,
    pub response_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthCheckResult {
    /// Classify a finished probe
    pub fn from_probe(
        backend: &str,
        elapsed: Duration,
        outcome: Result<()>,
        degraded_threshold: Duration,
    ) -> Self {
        let (status, error) = match outcome {
            Ok(()) if elapsed > degraded_threshold => (HealthStatus::Degraded, None),
            Ok(()) => (HealthStatus::Healthy, None),
            Err(e) => (HealthStatus::Unhealthy, Some(e.to_string())),
        };

        Self {
            backend: backend.to_string(),
            status,
            response_time_ms: elapsed.as_millis() as u64,
            timestamp: Utc::now(),
            error,
        }
    }
}

/// Run a probe with a timeout and classify its result
pub async fn probe<F>(
    backend: &str,
    timeout: Duration,
    degraded_threshold: Duration,
    check: F,
) -> HealthCheckResult
where
    F: Future<Output = Result<()>>,
{
    let start = Instant::now();
    let outcome = match tokio::time::timeout(timeout, check).await {
        Ok(outcome) => outcome,
        Err(_) => Err(crate::error::StoreError::TimeoutError {
            timeout_ms: timeout.as_millis() as u64,
            context: format!("{} health check", backend),
        }),
    };

    HealthCheckResult::from_probe(backend, start.elapsed(), outcome, degraded_threshold)
}
