//! In-process cache backend with TTL expiry and LRU eviction

use crate::cache::{
    config::CacheConfig,
    entry::CacheEntry,
    types::CacheStats,
    FastCache,
};
use crate::clock::{Clock, SystemClock};
use crate::error::{Result, StoreError};
use crate::record::{AddressRecord, LookupKey};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Fast cache tier held in process memory
///
/// - Thread-safe async access via RwLock
/// - Expired entries are dropped lazily on `get` and by [`start_auto_cleanup`]
/// - LRU eviction when the entry-count or byte limit is reached
pub struct MemoryCache {
    pub(crate) config: CacheConfig,
    clock: Arc<dyn Clock>,
    store: Arc<RwLock<CacheStore>>,
}

/// Internal cache storage
struct CacheStore {
    entries: HashMap<String, CacheEntry>,

    /// Recency stamp -> key; the first entry is the least recently used
    recency: BTreeMap<u64, String>,

    next_stamp: u64,

    stats: CacheStats,

    current_size_bytes: usize,
}

impl CacheStore {
    fn stamp(&mut self) -> u64 {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        stamp
    }
}

impl MemoryCache {
    /// Create a cache driven by the system clock
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a cache driven by an explicit clock
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        info!("Initializing memory cache with config: {:?}", config);

        let store = CacheStore {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            next_stamp: 0,
            stats: CacheStats::default(),
            current_size_bytes: 0,
        };

        Self {
            config,
            clock,
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// Store a record, replacing any existing entry for the key
    ///
    /// An entry larger than the whole cache is rejected and leaves any
    /// existing entry for the key in place.
    pub async fn insert(&self, key: &str, value: AddressRecord, ttl: Duration) -> Result<()> {
        let mut guard = self.store.write().await;
        let store = &mut *guard;

        let entry = CacheEntry::new(key.to_string(), value, ttl, self.clock.now(), store.stamp());
        let size = entry.metadata.size_bytes;

        if size > self.config.max_size_bytes {
            return Err(StoreError::Other(format!(
                "Entry of {} bytes exceeds cache size limit of {} bytes",
                size, self.config.max_size_bytes
            )));
        }

        // An overwrite must not count the old entry against the limits
        self.remove_entry(store, key);
        self.evict_if_needed(store, size)?;

        debug!("Caching entry: {} (ttl: {:?})", key, ttl);
        store.recency.insert(entry.metadata.last_used, key.to_string());
        store.entries.insert(key.to_string(), entry);
        store.current_size_bytes += size;

        self.update_stats(store);

        Ok(())
    }

    /// Fetch an unexpired record
    pub async fn get_record(&self, key: &str) -> Option<AddressRecord> {
        let now = self.clock.now();
        let mut guard = self.store.write().await;
        let store = &mut *guard;

        let Some(expired) = store.entries.get(key).map(|entry| entry.is_expired_at(now)) else {
            debug!("Cache miss: {}", key);
            store.stats.misses += 1;
            return None;
        };

        if expired {
            debug!("Cache entry expired: {}", key);
            store.stats.misses += 1;
            store.stats.evictions_ttl += 1;
            self.remove_entry(store, key);
            return None;
        }

        let stamp = store.stamp();
        let entry = store.entries.get_mut(key)?;
        store.stats.hits += 1;

        if self.config.enable_lru_eviction {
            let previous = std::mem::replace(&mut entry.metadata.last_used, stamp);
            store.recency.remove(&previous);
            store.recency.insert(stamp, key.to_string());
        }

        debug!("Cache hit: {}", key);
        Some(entry.value.clone())
    }

/// Remove all expired entries, returning how many were dropped
    pub async fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut store = self.store.write().await;

        let expired_keys: Vec<String> = store
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(&mut store, key);
        }

        if !expired_keys.is_empty() {
            store.stats.evictions_ttl += expired_keys.len() as u64;
            self.update_stats(&mut store);
            debug!("Cleaned up {} expired entries", expired_keys.len());
        }

        expired_keys.len()
    }

    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        store.stats.clone()
    }

    pub async fn size_bytes(&self) -> usize {
        let store = self.store.read().await;
        store.current_size_bytes
    }

    pub async fn len(&self) -> usize {
        let store = self.store.read().await;
        store.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        let store = self.store.read().await;
        store.entries.is_empty()
    }

    fn remove_entry(&self, store: &mut CacheStore, key: &str) {
        if let Some(entry) = store.entries.remove(key) {
            store.recency.remove(&entry.metadata.last_used);
            store.current_size_bytes = store
                .current_size_bytes
                .saturating_sub(entry.metadata.size_bytes);
            store.stats.entries = store.entries.len();
        }
    }

    fn evict_if_needed(&self, store: &mut CacheStore, needed_size: usize) -> Result<()> {
        while store.entries.len() >= self.config.max_entries {
            match store.recency.pop_first() {
                Some((_, key)) => {
                    debug!("Evicting entry due to max_entries limit: {}", key);
                    self.remove_entry(store, &key);
                    store.stats.evictions_size += 1;
                }
                None => break,
            }
        }

        while store.current_size_bytes + needed_size > self.config.max_size_bytes {
            match store.recency.pop_first() {
                Some((_, key)) => {
                    debug!("Evicting entry due to size limit: {}", key);
                    self.remove_entry(store, &key);
                    store.stats.evictions_size += 1;
                }
                None => {
                    warn!("Cannot evict more entries, cache size limit exceeded");
                    return Err(StoreError::Other("Cache size limit exceeded".to_string()));
                }
            }
        }

        Ok(())
    }

    fn update_stats(&self, store: &mut CacheStore) {
        store.stats.entries = store.entries.len();

        if self.config.enable_metrics {
            store.stats.size_bytes = store.current_size_bytes;
            store.stats.avg_entry_size = if store.entries.is_empty() {
                0
            } else {
                store.current_size_bytes / store.entries.len()
            };
        }
    }
}

#[async_trait]
impl FastCache for MemoryCache {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &LookupKey) -> Result<Option<AddressRecord>> {
        Ok(self.get_record(key.as_str()).await)
    }

    async fn put(&self, key: &LookupKey, record: &AddressRecord, ttl: Duration) -> Result<()> {
        self.insert(key.as_str(), record.clone(), ttl).await
    }
}

/// Background task that periodically sweeps expired entries
pub async fn start_auto_cleanup(cache: Arc<MemoryCache>) {
    let interval = cache.config.cleanup_interval;

    info!("Starting automatic cache cleanup task (interval: {:?})", interval);

    loop {
        tokio::time::sleep(interval).await;

        let removed = cache.cleanup_expired().await;
        if removed > 0 {
            debug!("Auto cleanup removed {} expired entries", removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const DAY: Duration = Duration::from_secs(86_400);

    fn record(cep: &str) -> AddressRecord {
        AddressRecord::new()
            .with_field("cep", cep)
            .with_field("localidade", "São Paulo")
    }

    fn cache_with_clock(config: CacheConfig) -> (MemoryCache, ManualClock) {
        let clock = ManualClock::new();
        let cache = MemoryCache::with_clock(config, Arc::new(clock.clone()));
        (cache, clock)
    }

    #[tokio::test]
    async fn test_basic_insert_and_get() {
        let cache = MemoryCache::new(CacheConfig::default());

        cache.insert("01001000", record("01001-000"), DAY).await.unwrap();

        let value = cache.get_record("01001000").await;
        assert_eq!(value, Some(record("01001-000")));

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let cache = MemoryCache::new(CacheConfig::default());

        assert_eq!(cache.get_record("99999999").await, None);

        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_ttl_expiration_with_manual_clock() {
        let (cache, clock) = cache_with_clock(CacheConfig::default());

        cache.insert("01001000", record("01001-000"), DAY).await.unwrap();

        clock.advance(DAY - Duration::from_secs(1));
        assert!(cache.get_record("01001000").await.is_some());

        clock.advance(Duration::from_secs(2));
        assert!(cache.get_record("01001000").await.is_none());

        let stats = cache.stats().await;
        assert_eq!(stats.evictions_ttl, 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_overwrite_resets_expiry() {
        let (cache, clock) = cache_with_clock(CacheConfig::default());

        cache.insert("01001000", record("old"), DAY).await.unwrap();
        clock.advance(Duration::from_secs(20 * 3600));
        cache.insert("01001000", record("new"), DAY).await.unwrap();
        clock.advance(Duration::from_secs(20 * 3600));

        assert_eq!(cache.get_record("01001000").await, Some(record("new")));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let config = CacheConfig::builder()
            .max_entries(3)
            .enable_lru_eviction(true)
            .build();
        let cache = MemoryCache::new(config);

        cache.insert("key1", record("1"), DAY).await.unwrap();
        cache.insert("key2", record("2"), DAY).await.unwrap();
        cache.insert("key3", record("3"), DAY).await.unwrap();

        // Touch key1 so key2 becomes the least recently used
        cache.get_record("key1").await;

        cache.insert("key4", record("4"), DAY).await.unwrap();

        assert!(cache.get_record("key2").await.is_none());
        assert!(cache.get_record("key1").await.is_some());
        assert!(cache.get_record("key3").await.is_some());
        assert!(cache.get_record("key4").await.is_some());

        let stats = cache.stats().await;
        assert_eq!(stats.evictions_size, 1);
    }

    #[tokio::test]
    async fn test_size_based_eviction() {
        let sample = CacheEntry::new("k1".to_string(), record("1"), DAY, chrono::Utc::now(), 0);
        let config = CacheConfig::builder()
            .max_size_bytes(sample.metadata.size_bytes * 2)
            .build();
        let cache = MemoryCache::new(config);

        cache.insert("k1", record("1"), DAY).await.unwrap();
        cache.insert("k2", record("2"), DAY).await.unwrap();
        cache.insert("k3", record("3"), DAY).await.unwrap();

        assert_eq!(cache.len().await, 2);
        assert!(cache.get_record("k1").await.is_none());
        assert!(cache.size_bytes().await <= sample.metadata.size_bytes * 2);
    }

    #[tokio::test]
    async fn test_oversized_entry_is_rejected() {
        let config = CacheConfig::builder().max_size_bytes(16).build();
        let cache = MemoryCache::new(config);

        let result = cache.insert("01001000", record("01001-000"), DAY).await;
        assert!(result.is_err());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_rejected_overwrite_keeps_existing_entry() {
        let sample =
            CacheEntry::new("01001000".to_string(), record("1"), DAY, chrono::Utc::now(), 0);
        let config = CacheConfig::builder()
            .max_size_bytes(sample.metadata.size_bytes + 64)
            .build();
        let cache = MemoryCache::new(config);

        cache.insert("01001000", record("1"), DAY).await.unwrap();

        let oversized = record("1").with_field("complemento", "x".repeat(4096));
        assert!(cache.insert("01001000", oversized, DAY).await.is_err());

        assert_eq!(cache.get_record("01001000").await, Some(record("1")));
        assert_eq!(cache.size_bytes().await, sample.metadata.size_bytes);
    }

    #[tokio::test]
    async fn test_repeated_hits_keep_one_recency_slot_per_entry() {
        let config = CacheConfig::builder().max_entries(2).build();
        let cache = MemoryCache::new(config);

        cache.insert("a", record("1"), DAY).await.unwrap();
        cache.insert("b", record("2"), DAY).await.unwrap();
        for _ in 0..100 {
            cache.get_record("a").await;
        }

        {
            let store = cache.store.read().await;
            assert_eq!(store.recency.len(), 2);
            assert_eq!(store.recency.values().next().map(String::as_str), Some("b"));
        }

        cache.insert("c", record("3"), DAY).await.unwrap();
        assert!(cache.get_record("b").await.is_none());
        assert!(cache.get_record("a").await.is_some());
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let (cache, clock) = cache_with_clock(CacheConfig::default());

        cache.insert("short", record("1"), Duration::from_secs(60)).await.unwrap();
        cache.insert("long", record("2"), DAY).await.unwrap();

        clock.advance(Duration::from_secs(120));

        assert_eq!(cache.cleanup_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert!(cache.get_record("long").await.is_some());
    }

    #[tokio::test]
    async fn test_fast_cache_trait() {
        let cache = MemoryCache::new(CacheConfig::default());
        let key = LookupKey::parse("01001000").unwrap();

        assert!(FastCache::get(&cache, &key).await.unwrap().is_none());
        cache.put(&key, &record("01001-000"), DAY).await.unwrap();
        assert_eq!(
            FastCache::get(&cache, &key).await.unwrap(),
            Some(record("01001-000"))
        );
        assert_eq!(cache.backend(), "memory");
    }
}
