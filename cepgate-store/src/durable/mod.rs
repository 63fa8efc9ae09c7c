//! # Durable Store Tier
//!
//! The second tier: a persistent key → record store with no expiry. It is
//! append-only from the lookup pipeline's point of view; records are only
//! ever inserted after an origin fetch.
//!
//! Each backend assigns its own identity to inserted records. That identity
//! never leaves the tier: [`DurableStore::find`] returns the bare
//! [`AddressRecord`].

pub mod memory;
pub mod neo4j;

use crate::error::Result;
use crate::record::{AddressRecord, LookupKey};
use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use neo4j::Neo4jStore;

/// Persistent key → record store
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Short backend name for logs and health reports
    fn backend(&self) -> &'static str;

    /// Exact-key lookup, identity stripped
    async fn find(&self, key: &LookupKey) -> Result<Option<AddressRecord>>;

    /// Append a record under `key`, returning the identity the store assigned
    ///
    /// No uniqueness check is made; inserting the same key twice keeps both
    /// copies and `find` returns the oldest.
    async fn insert(&self, key: &LookupKey, record: &AddressRecord) -> Result<Uuid>;

    /// Check the backend is reachable
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
