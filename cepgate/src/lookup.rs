//! Tiered lookup pipeline
//!
//! A lookup walks the tiers in a fixed order, fast cache → durable store →
//! origin, stopping at the first hit. A hit below the top tier back-fills
//! every faster tier it bypassed:
//!
//! | answered by | durable store | fast cache |
//! |-------------|---------------|------------|
//! | cache       | -             | -          |
//! | store       | -             | put (TTL)  |
//! | origin      | insert        | put (TTL)  |
//!
//! Tier I/O failures and timeouts are logged and treated as misses; only the
//! origin's verdict can fail a lookup.

use crate::error::LookupError;
use crate::origin::{OriginResolver, OriginResponse};
use cepgate_store::{
    health, AddressRecord, DurableStore, FastCache, HealthCheckResult, LookupKey, StoreError,
    DEFAULT_CACHE_TTL,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default bound on a single cache or store call
pub const DEFAULT_TIER_TIMEOUT: Duration = Duration::from_secs(2);

/// Which tier answered a lookup
///
/// The serialized names are part of the response contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "cache")]
    Cache,
    #[serde(rename = "mongodb")]
    Store,
    #[serde(rename = "api")]
    Origin,
}

/// Result of one pass through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    CacheHit(AddressRecord),
    StoreHit(AddressRecord),
    OriginHit(AddressRecord),
    NotFound,
    OriginUnavailable,
}

/// A successful lookup, as sent to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolved {
    pub source: Source,
    pub data: AddressRecord,
}

impl LookupOutcome {
    /// Map the outcome onto the caller-facing contract
    pub fn into_result(self) -> Result<Resolved, LookupError> {
        let (source, data) = match self {
            LookupOutcome::CacheHit(record) => (Source::Cache, record),
            LookupOutcome::StoreHit(record) => (Source::Store, record),
            LookupOutcome::OriginHit(record) => (Source::Origin, record),
            LookupOutcome::NotFound => return Err(LookupError::NotFound),
            LookupOutcome::OriginUnavailable => return Err(LookupError::DependencyFailure),
        };
        Ok(Resolved { source, data })
    }
}

/// Orchestrates the fast cache, durable store and origin tiers
///
/// Both storage tiers are optional, which gives the origin-only,
/// cache-only and full pipelines from one implementation. The service holds
/// no mutable state of its own and can be shared across requests.
pub struct LookupService {
    cache: Option<Arc<dyn FastCache>>,
    store: Option<Arc<dyn DurableStore>>,
    origin: Arc<dyn OriginResolver>,
    cache_ttl: Duration,
    tier_timeout: Duration,
}

impl LookupService {
    /// Origin-only pipeline; add tiers with the `with_*` methods
    pub fn new(origin: Arc<dyn OriginResolver>) -> Self {
        Self {
            cache: None,
            store: None,
            origin,
            cache_ttl: DEFAULT_CACHE_TTL,
            tier_timeout: DEFAULT_TIER_TIMEOUT,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn FastCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn DurableStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_tier_timeout(mut self, timeout: Duration) -> Self {
        self.tier_timeout = timeout;
        self
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Validate a raw identifier, run the pipeline and classify the outcome
    pub async fn resolve(&self, raw_key: &str) -> Result<Resolved, LookupError> {
        let key = LookupKey::parse(raw_key).map_err(|e| {
            debug!("Rejecting lookup key: {}", e);
            LookupError::InvalidKey(raw_key.to_string())
        })?;

        self.lookup(&key).await.into_result()
    }

    /// Run the tiered pipeline for one key
    pub async fn lookup(&self, key: &LookupKey) -> LookupOutcome {
        // 1. Fast cache
        if let Some(record) = self.cache_get(key).await {
            info!(cep = %key, source = "cache", "CEP resolved");
            return LookupOutcome::CacheHit(record);
        }

        // 2. Durable store, back-filling the cache
        if let Some(record) = self.store_find(key).await {
            self.fill_cache(key, &record).await;
            info!(cep = %key, source = "store", "CEP resolved");
            return LookupOutcome::StoreHit(record);
        }

        // 3. Origin, back-filling both tiers on success only
        match self.origin.resolve(key).await {
            OriginResponse::Found(record) => {
                self.fill_store(key, &record).await;
                self.fill_cache(key, &record).await;
                info!(cep = %key, source = "origin", "CEP resolved");
                LookupOutcome::OriginHit(record)
            }
            OriginResponse::NotFound => {
                info!(cep = %key, "CEP not found at origin");
                LookupOutcome::NotFound
            }
            OriginResponse::TransportFailure(reason) => {
                warn!(cep = %key, %reason, "Origin unavailable");
                LookupOutcome::OriginUnavailable
            }
        }
    }

    /// Probe every enabled storage tier
    pub async fn tier_health(&self, degraded_threshold: Duration) -> Vec<HealthCheckResult> {
        let mut results = Vec::new();

        if let Some(cache) = &self.cache {
            let name = format!("cache:{}", cache.backend());
            results.push(
                health::probe(&name, self.tier_timeout, degraded_threshold, cache.ping()).await,
            );
        }

        if let Some(store) = &self.store {
            let name = format!("store:{}", store.backend());
            results.push(
                health::probe(&name, self.tier_timeout, degraded_threshold, store.ping()).await,
            );
        }

        results
    }

    async fn cache_get(&self, key: &LookupKey) -> Option<AddressRecord> {
        let cache = self.cache.as_ref()?;

        match self.bounded("cache get", cache.get(key)).await {
            Ok(found) => {
                debug!("Cache {}: {}", if found.is_some() { "hit" } else { "miss" }, key);
                found
            }
            Err(e) => {
                warn!(cep = %key, error = %e, "Cache unavailable, treating as miss");
                None
            }
        }
    }

    async fn store_find(&self, key: &LookupKey) -> Option<AddressRecord> {
        let store = self.store.as_ref()?;

        match self.bounded("store find", store.find(key)).await {
            Ok(found) => {
                debug!("Store {}: {}", if found.is_some() { "hit" } else { "miss" }, key);
                found
            }
            Err(e) => {
                warn!(cep = %key, error = %e, "Store unavailable, treating as miss");
                None
            }
        }
    }

    async fn fill_cache(&self, key: &LookupKey, record: &AddressRecord) {
        let Some(cache) = &self.cache else { return };

        if let Err(e) = self
            .bounded("cache put", cache.put(key, record, self.cache_ttl))
            .await
        {
            warn!(cep = %key, error = %e, "Failed to back-fill cache");
        }
    }

    async fn fill_store(&self, key: &LookupKey, record: &AddressRecord) {
        let Some(store) = &self.store else { return };

        match self.bounded("store insert", store.insert(key, record)).await {
            Ok(id) => debug!("Stored {} (id: {})", key, id),
            Err(e) => warn!(cep = %key, error = %e, "Failed to back-fill store"),
        }
    }

    async fn bounded<T, F>(&self, context: &str, operation: F) -> cepgate_store::Result<T>
    where
        F: Future<Output = cepgate_store::Result<T>>,
    {
        match tokio::time::timeout(self.tier_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::TimeoutError {
                timeout_ms: self.tier_timeout.as_millis() as u64,
                context: context.to_string(),
            }),
        }
    }
}
