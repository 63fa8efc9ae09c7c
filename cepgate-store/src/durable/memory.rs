//! In-memory durable store, for tests and single-process runs

use crate::durable::DurableStore;
use crate::error::Result;
use crate::record::{AddressRecord, LookupKey, StoredRecord};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Append-only vector of stored records
///
/// Nothing survives a restart; it stands in for a real database where the
/// pipeline's tier semantics are what matters.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored records, duplicates included
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Number of records stored under `key`
    pub async fn count(&self, key: &LookupKey) -> usize {
        self.records
            .read()
            .await
            .iter()
            .filter(|stored| &stored.key == key)
            .count()
    }

    /// Identities assigned under `key`, in insertion order
    pub async fn ids(&self, key: &LookupKey) -> Vec<Uuid> {
        self.records
            .read()
            .await
            .iter()
            .filter(|stored| &stored.key == key)
            .map(|stored| stored.id)
            .collect()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find(&self, key: &LookupKey) -> Result<Option<AddressRecord>> {
        let records = self.records.read().await;
        let found = records
            .iter()
            .find(|stored| &stored.key == key)
            .cloned()
            .map(StoredRecord::into_record);

        debug!("Memory store {}: {}", if found.is_some() { "hit" } else { "miss" }, key);
        Ok(found)
    }

    async fn insert(&self, key: &LookupKey, record: &AddressRecord) -> Result<Uuid> {
        let stored = StoredRecord::new(key.clone(), record.clone());
        let id = stored.id;

        self.records.write().await.push(stored);
        debug!("Memory store insert: {} (id: {})", key, id);
        Ok(id)
    }
}
