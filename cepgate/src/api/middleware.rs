//! Authentication middleware for Axum

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use super::auth::{ApiKeyAuth, API_KEY_HEADER};
use crate::error::LookupError;

/// Authentication state shared across requests
#[derive(Clone)]
pub struct AuthState {
    pub api_keys: Arc<ApiKeyAuth>,
}

impl AuthState {
    pub fn new(keys: &[String]) -> Self {
        Self {
            api_keys: Arc::new(ApiKeyAuth::new(keys.iter().cloned())),
        }
    }
}

/// Reject requests without a recognized `X-API-Key` before any lookup runs
pub async fn api_key_middleware(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Result<Response, LookupError> {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    if let Err(e) = state.api_keys.validate(presented) {
        debug!("Rejected request to {}: {}", request.uri().path(), e);
        return Err(e);
    }

    Ok(next.run(request).await)
}
