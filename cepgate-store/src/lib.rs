//! # cepgate-store
//!
//! Storage tiers for postal-code (CEP) address records.
//!
//! ## Features
//!
//! - [`FastCache`] tier with TTL expiry: in-process ([`MemoryCache`]) or
//!   Redis ([`RedisCache`])
//! - [`DurableStore`] tier with no expiry: Neo4j ([`Neo4jStore`]) or
//!   in-process ([`MemoryStore`])
//! - Shared record model: [`LookupKey`], [`AddressRecord`] and the
//!   [`StoredRecord`] envelope that keeps the store identity inside the tier
//! - Health probes for every backend
//!
//! ## Example
//!
//! ```no_run
//! use cepgate_store::{
//!     AddressRecord, DurableStore, LookupKey, Neo4jClient, Neo4jConfig, Neo4jStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Neo4jClient::connect(&Neo4jConfig::default()).await?;
//!     let store = Neo4jStore::new(client).await?;
//!
//!     let key = LookupKey::parse("01001000")?;
//!     let record = AddressRecord::new()
//!         .with_field("cep", "01001-000")
//!         .with_field("logradouro", "Praça da Sé");
//!
//!     store.insert(&key, &record).await?;
//!     assert_eq!(store.find(&key).await?, Some(record));
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod clock;
pub mod connection;
pub mod durable;
pub mod error;
pub mod health;
pub mod record;

// Re-export main types for convenience
pub use cache::{
    CacheConfig, CacheConfigBuilder, CacheStats, FastCache, MemoryCache, RedisCache,
    DEFAULT_CACHE_TTL,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use connection::{Neo4jClient, Neo4jConfig};
pub use durable::{DurableStore, MemoryStore, Neo4jStore};
pub use error::{Result, StoreError};
pub use health::{HealthCheckResult, HealthStatus};
pub use record::{AddressRecord, LookupKey, StoredRecord, ORIGIN_ERROR_FIELD};
pub use uuid::Uuid;
