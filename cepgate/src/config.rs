//! Service configuration, read from the environment

use anyhow::{Context, Result};
use cepgate_store::{Neo4jConfig, DEFAULT_CACHE_TTL};
use std::time::Duration;

use crate::lookup::DEFAULT_TIER_TIMEOUT;
use crate::origin::{DEFAULT_ORIGIN_TIMEOUT, DEFAULT_VIACEP_BASE_URL};

/// Everything needed to assemble the pipeline and the HTTP server
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,

    /// Accepted `X-API-Key` values; empty disables the guard
    pub api_keys: Vec<String>,

    /// Use a fast cache tier at all
    pub cache_enabled: bool,
    /// Redis URL for the fast cache; `None` keeps the cache in process
    pub redis_url: Option<String>,

    /// Neo4j settings for the durable tier; `None` disables it unless
    /// `memory_store` is set
    pub neo4j: Option<Neo4jConfig>,
    /// Keep the durable tier in process memory
    pub memory_store: bool,

    pub origin_base_url: String,
    pub origin_timeout: Duration,
    /// Bound on every cache or store call, including the start-up connect
    pub tier_timeout: Duration,
    /// Lifetime of fast cache entries, applied exactly
    ///
    /// Always 24 hours in normal operation. `CEPGATE_CACHE_TTL_SECS` exists
    /// only as an operational escape hatch (e.g. draining a bad cache
    /// quickly) and should stay unset otherwise.
    pub cache_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            api_keys: Vec::new(),
            cache_enabled: true,
            redis_url: None,
            neo4j: None,
            memory_store: false,
            origin_base_url: DEFAULT_VIACEP_BASE_URL.to_string(),
            origin_timeout: DEFAULT_ORIGIN_TIMEOUT,
            tier_timeout: DEFAULT_TIER_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl AppConfig {
    /// Read the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_source(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    ///
    /// Unset and blank variables fall back to the defaults.
    pub fn from_source<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| get(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let port = match var("CEPGATE_PORT") {
            Some(v) => v.parse().with_context(|| format!("Invalid CEPGATE_PORT: {}", v))?,
            None => defaults.port,
        };

        let api_keys = var("CEPGATE_API_KEYS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let neo4j = var("NEO4J_URI").map(|uri| {
            let base = Neo4jConfig::default();
            Neo4jConfig {
                uri,
                user: var("NEO4J_USER").unwrap_or(base.user),
                password: var("NEO4J_PASSWORD").unwrap_or(base.password),
                database: var("NEO4J_DATABASE").unwrap_or(base.database),
                ..base
            }
        });

        let origin_timeout = match var("VIACEP_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.parse()
                    .with_context(|| format!("Invalid VIACEP_TIMEOUT_SECS: {}", v))?,
            ),
            None => defaults.origin_timeout,
        };

        let tier_timeout = match var("CEPGATE_TIER_TIMEOUT_MS") {
            Some(v) => Duration::from_millis(
                v.parse()
                    .with_context(|| format!("Invalid CEPGATE_TIER_TIMEOUT_MS: {}", v))?,
            ),
            None => defaults.tier_timeout,
        };

        let cache_ttl = match var("CEPGATE_CACHE_TTL_SECS") {
            Some(v) => Duration::from_secs(
                v.parse()
                    .with_context(|| format!("Invalid CEPGATE_CACHE_TTL_SECS: {}", v))?,
            ),
            None => defaults.cache_ttl,
        };

        let config = Self {
            host: var("CEPGATE_HOST").unwrap_or(defaults.host),
            port,
            api_keys,
            cache_enabled: defaults.cache_enabled,
            redis_url: var("REDIS_URL"),
            neo4j,
            memory_store: defaults.memory_store,
            origin_base_url: var("VIACEP_BASE_URL").unwrap_or(defaults.origin_base_url),
            origin_timeout,
            tier_timeout,
            cache_ttl,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.origin_timeout.is_zero() {
            anyhow::bail!("Origin timeout must be greater than zero");
        }
        if self.tier_timeout.is_zero() {
            anyhow::bail!("Tier timeout must be greater than zero");
        }
        if self.cache_ttl.is_zero() {
            anyhow::bail!("Cache TTL must be greater than zero");
        }
        Ok(())
    }

    pub fn auth_enabled(&self) -> bool {
        !self.api_keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_source(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.origin_timeout, Duration::from_secs(10));
        assert_eq!(config.cache_ttl, Duration::from_secs(86_400));
        assert_eq!(config.origin_base_url, "https://viacep.com.br/ws");
        assert!(config.redis_url.is_none());
        assert!(config.neo4j.is_none());
        assert!(!config.auth_enabled());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("CEPGATE_PORT", "9000"),
            ("CEPGATE_API_KEYS", "alpha, beta,,"),
            ("REDIS_URL", "redis://redis:6379/0"),
            ("NEO4J_URI", "bolt://neo4j:7687"),
            ("NEO4J_PASSWORD", "secret"),
            ("VIACEP_TIMEOUT_SECS", "3"),
            ("CEPGATE_TIER_TIMEOUT_MS", "250"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.api_keys, vec!["alpha".to_string(), "beta".to_string()]);
        assert!(config.auth_enabled());
        assert_eq!(config.redis_url.as_deref(), Some("redis://redis:6379/0"));

        let neo4j = config.neo4j.unwrap();
        assert_eq!(neo4j.uri, "bolt://neo4j:7687");
        assert_eq!(neo4j.password, "secret");
        assert_eq!(neo4j.user, "neo4j");

        assert_eq!(config.origin_timeout, Duration::from_secs(3));
        assert_eq!(config.tier_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = from_pairs(&[("CEPGATE_API_KEYS", "  "), ("REDIS_URL", "")]).unwrap();

        assert!(!config.auth_enabled());
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(from_pairs(&[("CEPGATE_PORT", "eighty")]).is_err());
        assert!(from_pairs(&[("VIACEP_TIMEOUT_SECS", "0")]).is_err());
        assert!(from_pairs(&[("CEPGATE_CACHE_TTL_SECS", "-1")]).is_err());
    }
}
