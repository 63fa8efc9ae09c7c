//! Redis-backed fast cache tier

use crate::cache::FastCache;
use crate::error::{Result, StoreError};
use crate::record::{AddressRecord, LookupKey};
use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, info};

const CONNECT_RETRIES: usize = 1;
const RETRY_MAX_DELAY_MS: u64 = 200;

/// Fast cache tier shared between service instances through Redis
///
/// Records are stored as JSON text under the bare postal code with `SETEX`,
/// so expiry is enforced by Redis itself.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis (e.g. `redis://localhost:6379/0`)
    ///
    /// `timeout` bounds each connection attempt. An unreachable server fails
    /// after a single retry instead of the manager's default backoff.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        info!("Connecting to Redis at {}", url);

        let client = redis::Client::open(url)
            .map_err(|e| StoreError::ConfigError(format!("Invalid Redis URL: {}", e)))?;

        let config = ConnectionManagerConfig::new()
            .set_connection_timeout(timeout)
            .set_number_of_retries(CONNECT_RETRIES)
            .set_max_delay(RETRY_MAX_DELAY_MS);

        let conn = ConnectionManager::new_with_config(client, config)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        info!("Successfully connected to Redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl FastCache for RedisCache {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &LookupKey) -> Result<Option<AddressRecord>> {
        let mut conn = self.conn.clone();
        let cached: Option<String> = conn.get(key.as_str()).await?;

        match cached {
            Some(text) => {
                debug!("Redis hit: {}", key);
                Ok(Some(AddressRecord::from_json_str(&text)?))
            }
            None => {
                debug!("Redis miss: {}", key);
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &LookupKey, record: &AddressRecord, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let payload = record.to_json_string()?;
        // SETEX rejects a zero expiry
        let ttl_secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(key.as_str(), payload, ttl_secs).await?;
        debug!("Redis set: {} (ttl: {}s)", key, ttl_secs);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(StoreError::ConnectionError(format!(
                "Unexpected PING reply: {}",
                pong
            )))
        }
    }
}
