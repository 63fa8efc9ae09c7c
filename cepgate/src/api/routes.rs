//! API routes for the CEP lookup service

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use cepgate_store::HealthCheckResult;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::error::LookupError;
use crate::lookup::{LookupService, Resolved};

/// Tier probes slower than this are reported as degraded
const DEGRADED_THRESHOLD: Duration = Duration::from_millis(500);

/// Application state
pub struct AppState {
    pub lookup: Arc<LookupService>,
    pub auth_enabled: bool,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub auth_enabled: bool,
    pub tiers: Vec<HealthCheckResult>,
}

/// Health check endpoint
///
/// Always answers 200: the service can still resolve through the origin
/// when a storage tier is down.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tiers = state.lookup.tier_health(DEGRADED_THRESHOLD).await;
    let all_operational = tiers.iter().all(|t| t.status.is_operational());

    Json(HealthResponse {
        status: if all_operational { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        auth_enabled: state.auth_enabled,
        tiers,
    })
}

/// Resolve a postal code through the tiered pipeline
pub async fn get_cep(
    State(state): State<Arc<AppState>>,
    Path(cep): Path<String>,
) -> Result<Json<Resolved>, LookupError> {
    state.lookup.resolve(&cep).await.map(Json)
}
