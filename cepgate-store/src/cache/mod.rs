//! # Fast Cache Tier
//!
//! The first tier consulted for every lookup: a key → record store whose
//! entries expire after a TTL.
//!
//! Two backends implement [`FastCache`]:
//!
//! - [`MemoryCache`]: in-process map with TTL expiry, LRU/size eviction and
//!   hit/miss statistics. Used for single-instance deployments and tests.
//! - [`RedisCache`]: `SETEX`-based cache shared across instances.
//!
//! ## Example
//!
//! ```rust
//! use cepgate_store::cache::{CacheConfig, FastCache, MemoryCache, DEFAULT_CACHE_TTL};
//! use cepgate_store::{AddressRecord, LookupKey};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let cache = MemoryCache::new(CacheConfig::default());
//! let key = LookupKey::parse("01001000")?;
//! let record = AddressRecord::new().with_field("cep", "01001-000");
//!
//! cache.put(&key, &record, DEFAULT_CACHE_TTL).await?;
//! assert_eq!(cache.get(&key).await?, Some(record));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod redis_cache;
pub mod store;
pub mod types;

use crate::error::Result;
use crate::record::{AddressRecord, LookupKey};
use async_trait::async_trait;
use std::time::Duration;

pub use redis_cache::RedisCache;
pub use config::{CacheConfig, CacheConfigBuilder};
pub use entry::{CacheEntry, CacheMetadata};
pub use store::{start_auto_cleanup, MemoryCache};
pub use types::CacheStats;

/// Lifetime of a fast-tier entry (24 hours)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Ephemeral key → record store with per-entry expiry
///
/// Implementations must be safe for concurrent use by many lookups.
#[async_trait]
pub trait FastCache: Send + Sync {
    /// Short backend name for logs and health reports
    fn backend(&self) -> &'static str;

    /// Return the record if present and unexpired
    async fn get(&self, key: &LookupKey) -> Result<Option<AddressRecord>>;

    /// Store a record expiring `ttl` from now, overwriting any existing entry
    async fn put(&self, key: &LookupKey, record: &AddressRecord, ttl: Duration) -> Result<()>;

    /// Check the backend is reachable
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
