//! Origin resolver: the authoritative postal-code lookup
//!
//! Consulted only when both storage tiers miss. Transport problems are
//! returned as [`OriginResponse::TransportFailure`] values, never as errors,
//! so the orchestrator can tell "the origin said no" apart from "the origin
//! could not be reached".

use async_trait::async_trait;
use cepgate_store::{AddressRecord, LookupKey};
use std::time::Duration;
use tracing::{debug, warn};

/// Default ViaCEP endpoint; the key and `/json` are appended per request
pub const DEFAULT_VIACEP_BASE_URL: &str = "https://viacep.com.br/ws";

/// Bound on a single origin call
pub const DEFAULT_ORIGIN_TIMEOUT: Duration = Duration::from_secs(10);

/// What the origin said about a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginResponse {
    /// The origin knows the postal code
    Found(AddressRecord),
    /// The origin answered, carrying the error marker
    NotFound,
    /// Timeout, connection error, non-success status or undecodable body
    TransportFailure(String),
}

/// Authoritative lookup used as the last tier
#[async_trait]
pub trait OriginResolver: Send + Sync {
    async fn resolve(&self, key: &LookupKey) -> OriginResponse;
}

/// HTTP client for the ViaCEP web service
#[derive(Debug, Clone)]
pub struct ViaCepClient {
    http: reqwest::Client,
    base_url: String,
}

impl ViaCepClient {
    /// Create a client with the given base URL and per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cepgate/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Client for the public ViaCEP service with the default timeout
    pub fn with_defaults() -> reqwest::Result<Self> {
        Self::new(DEFAULT_VIACEP_BASE_URL, DEFAULT_ORIGIN_TIMEOUT)
    }

    fn url_for(&self, key: &LookupKey) -> String {
        format!("{}/{}/json", self.base_url, key)
    }
}

#[async_trait]
impl OriginResolver for ViaCepClient {
    async fn resolve(&self, key: &LookupKey) -> OriginResponse {
        let url = self.url_for(key);
        debug!("Querying origin: {}", url);

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Origin request for {} failed: {}", key, e);
                return OriginResponse::TransportFailure(e.to_string());
            }
        };

        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(e) => {
                warn!("Origin returned an error status for {}: {}", key, e);
                return OriginResponse::TransportFailure(e.to_string());
            }
        };

        let payload: serde_json::Value = match response.json().await {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Origin body for {} could not be decoded: {}", key, e);
                return OriginResponse::TransportFailure(e.to_string());
            }
        };

        match AddressRecord::from_json(payload) {
            Ok(record) if record.has_error_marker() => {
                debug!("Origin reports no such postal code: {}", key);
                OriginResponse::NotFound
            }
            Ok(record) => {
                debug!("Origin resolved {}", key);
                OriginResponse::Found(record)
            }
            Err(e) => {
                warn!("Origin payload for {} is not an address: {}", key, e);
                OriginResponse::TransportFailure(e.to_string())
            }
        }
    }
}
