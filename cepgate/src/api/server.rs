//! API server for the CEP lookup service

use anyhow::Result;
use axum::{middleware::from_fn_with_state, routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use super::middleware::{api_key_middleware, AuthState};
use super::routes::{get_cep, health_check, AppState};
use crate::config::AppConfig;
use crate::lookup::LookupService;

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    pub host: String,
    pub port: u16,
    /// Accepted `X-API-Key` values; empty leaves `/cep` unguarded
    pub api_keys: Vec<String>,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            api_keys: Vec::new(),
        }
    }
}

impl From<&AppConfig> for ApiServerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            api_keys: config.api_keys.clone(),
        }
    }
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    lookup: Arc<LookupService>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, lookup: Arc<LookupService>) -> Self {
        Self { config, lookup }
    }

    /// Build the router
    ///
    /// `/health` is public; `/cep/:cep` sits behind the API-key guard when
    /// keys are configured.
    pub fn router(&self) -> Router {
        let auth_enabled = !self.config.api_keys.is_empty();

        let app_state = Arc::new(AppState {
            lookup: Arc::clone(&self.lookup),
            auth_enabled,
        });

        let cep_route = if auth_enabled {
            let auth_state = AuthState::new(&self.config.api_keys);
            get(get_cep).route_layer(from_fn_with_state(auth_state, api_key_middleware))
        } else {
            get(get_cep)
        };

        Router::new()
            .route("/health", get(health_check))
            .route("/cep/:cep", cep_route)
            .with_state(app_state)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    /// Bind the configured address and serve until the process stops
    pub async fn start(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        info!(
            "Starting API server on {} (API key guard: {})",
            listener.local_addr()?,
            if self.config.api_keys.is_empty() { "off" } else { "on" }
        );

        let app = self.router();
        axum::serve(listener, app).await?;

        Ok(())
    }
}
