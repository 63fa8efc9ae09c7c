//! HTTP API for the CEP lookup service

pub mod auth;
pub mod middleware;
pub mod routes;
pub mod server;

pub use auth::ApiKeyAuth;
pub use middleware::AuthState;
pub use server::{ApiServer, ApiServerConfig};
