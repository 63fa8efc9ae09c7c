//! Cache entry with expiry and recency metadata

use crate::record::AddressRecord;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A cached record together with its bookkeeping
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub value: AddressRecord,
    pub metadata: CacheMetadata,
}

/// Metadata associated with a cache entry
#[derive(Debug, Clone)]
pub struct CacheMetadata {
    /// When the entry expires
    pub expires_at: DateTime<Utc>,

    /// Recency stamp; the lowest live stamp is the LRU victim
    pub last_used: u64,

    /// Approximate size of the entry in bytes
    pub size_bytes: usize,
}

impl CacheEntry {
    /// Create an entry that expires `ttl` after `now`
    pub fn new(
        key: String,
        value: AddressRecord,
        ttl: Duration,
        now: DateTime<Utc>,
        stamp: u64,
    ) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::days(1));
        let mut entry = Self {
            key,
            value,
            metadata: CacheMetadata {
                expires_at: now + ttl,
                last_used: stamp,
                size_bytes: 0,
            },
        };
        entry.metadata.size_bytes = entry.calculate_size();
        entry
    }

    /// An entry is live up to and including its expiry instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.metadata.expires_at
    }

    /// Approximate size: key + field text + metadata overhead
    pub fn calculate_size(&self) -> usize {
        let fields: usize = self
            .value
            .fields()
            .iter()
            .map(|(name, value)| name.len() + value.len())
            .sum();
        self.key.len() + fields + std::mem::size_of::<CacheMetadata>()
    }
}
