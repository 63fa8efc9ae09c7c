//! Builds the tier clients once at start-up and hands them to the pipeline

use anyhow::{Context, Result};
use cepgate_store::{
    cache::start_auto_cleanup, CacheConfig, DurableStore, FastCache, MemoryCache, MemoryStore,
    Neo4jClient, Neo4jStore, RedisCache,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::lookup::LookupService;
use crate::origin::ViaCepClient;

/// Connect every configured tier and assemble the lookup service
///
/// Each tier connect is bounded by the tier timeout. A tier that cannot be
/// reached is left out and lookups fall through to the next one.
pub async fn build_lookup_service(config: &AppConfig) -> Result<LookupService> {
    let origin = ViaCepClient::new(&config.origin_base_url, config.origin_timeout)
        .context("Failed to build origin HTTP client")?;
    info!(
        "Origin: {} (timeout: {:?})",
        config.origin_base_url, config.origin_timeout
    );

    let mut service = LookupService::new(Arc::new(origin))
        .with_cache_ttl(config.cache_ttl)
        .with_tier_timeout(config.tier_timeout);

    if let Some(cache) = build_cache(config).await? {
        info!("Fast cache tier: {}", cache.backend());
        service = service.with_cache(cache);
    } else {
        info!("Fast cache tier disabled");
    }

    if let Some(store) = build_store(config).await {
        info!("Durable store tier: {}", store.backend());
        service = service.with_store(store);
    } else {
        info!("Durable store tier disabled");
    }

    Ok(service)
}

async fn build_cache(config: &AppConfig) -> Result<Option<Arc<dyn FastCache>>> {
    if !config.cache_enabled {
        return Ok(None);
    }

    if let Some(url) = &config.redis_url {
        let cache = connect_tier(
            "Redis cache",
            config.tier_timeout,
            RedisCache::connect(url, config.tier_timeout),
        )
        .await;
        return Ok(cache.map(|c| Arc::new(c) as Arc<dyn FastCache>));
    }

    let cache_config = CacheConfig::default();
    cache_config.validate()?;
    let auto_cleanup = cache_config.enable_auto_cleanup;

    let cache = Arc::new(MemoryCache::new(cache_config));
    if auto_cleanup {
        tokio::spawn(start_auto_cleanup(Arc::clone(&cache)));
    }
    Ok(Some(cache))
}

async fn build_store(config: &AppConfig) -> Option<Arc<dyn DurableStore>> {
    if let Some(neo4j) = &config.neo4j {
        let store = connect_tier("Neo4j store", config.tier_timeout, async {
            let client = Neo4jClient::connect(neo4j).await?;
            Neo4jStore::new(client).await
        })
        .await;
        return store.map(|s| Arc::new(s) as Arc<dyn DurableStore>);
    }

    if config.memory_store {
        return Some(Arc::new(MemoryStore::new()));
    }

    None
}

/// Run a tier connect under `timeout`, logging and dropping the tier on failure
async fn connect_tier<T, F>(tier: &str, timeout: Duration, connect: F) -> Option<T>
where
    F: Future<Output = cepgate_store::Result<T>>,
{
    match tokio::time::timeout(timeout, connect).await {
        Ok(Ok(client)) => Some(client),
        Ok(Err(e)) => {
            warn!("{} unavailable, continuing without it: {}", tier, e);
            None
        }
        Err(_) => {
            warn!(
                "{} did not connect within {:?}, continuing without it",
                tier, timeout
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::Source;
    use cepgate_store::Neo4jConfig;
    use serde_json::json;
    use std::time::Instant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    async fn origin() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ws/01001000/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cep": "01001-000",
                "uf": "SP"
            })))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_default_config_builds_memory_cache_only() {
        let service = build_lookup_service(&AppConfig::default()).await.unwrap();

        assert!(service.has_cache());
        assert!(!service.has_store());
    }

    #[tokio::test]
    async fn test_memory_store_and_no_cache() {
        let config = AppConfig {
            cache_enabled: false,
            memory_store: true,
            ..AppConfig::default()
        };
        let service = build_lookup_service(&config).await.unwrap();

        assert!(!service.has_cache());
        assert!(service.has_store());
    }

    #[tokio::test]
    async fn test_unreachable_redis_is_skipped() {
        let server = origin().await;
        let config = AppConfig {
            redis_url: Some(format!("redis://127.0.0.1:{}/0", closed_port())),
            origin_base_url: format!("{}/ws", server.uri()),
            tier_timeout: Duration::from_millis(500),
            ..AppConfig::default()
        };

        let started = Instant::now();
        let service = build_lookup_service(&config).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));

        assert!(!service.has_cache());
        let resolved = service.resolve("01001000").await.unwrap();
        assert_eq!(resolved.source, Source::Origin);
    }

    #[tokio::test]
    async fn test_unreachable_neo4j_is_skipped() {
        let server = origin().await;
        let config = AppConfig {
            cache_enabled: false,
            neo4j: Some(Neo4jConfig {
                uri: format!("bolt://127.0.0.1:{}", closed_port()),
                ..Neo4jConfig::default()
            }),
            origin_base_url: format!("{}/ws", server.uri()),
            tier_timeout: Duration::from_millis(500),
            ..AppConfig::default()
        };

        let started = Instant::now();
        let service = build_lookup_service(&config).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));

        assert!(!service.has_store());
        let resolved = service.resolve("01001000").await.unwrap();
        assert_eq!(resolved.source, Source::Origin);
    }

    #[tokio::test]
    async fn test_connect_tier_times_out() {
        let started = Instant::now();
        let result: Option<()> = connect_tier(
            "stalled tier",
            Duration::from_millis(100),
            std::future::pending::<cepgate_store::Result<()>>(),
        )
        .await;

        assert!(result.is_none());
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
