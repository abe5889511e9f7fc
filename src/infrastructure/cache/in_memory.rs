//! In-memory cache store implementation using moka

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use moka::future::Cache as MokaCache;
use moka::ops::compute::{CompResult, Op};
use moka::policy::EvictionPolicy;
use tracing::debug;

use crate::domain::DomainError;
use crate::domain::cache::{CacheEntry, CacheStore};

/// Configuration for the in-memory cache store
#[derive(Debug, Clone, Default)]
pub struct InMemoryCacheStoreConfig {
    /// Maximum number of entries; unbounded when `None`
    pub max_entries: Option<u64>,
}

impl InMemoryCacheStoreConfig {
    /// Bound the store, evicting least-recently-used entries beyond `max`
    pub fn with_max_entries(mut self, max: u64) -> Self {
        self.max_entries = Some(max);
        self
    }
}

/// Value stored in moka
///
/// The entry itself is immutable once inserted; hits only touch the atomic
/// counter, so readers never observe a partially updated entry.
#[derive(Debug)]
struct StoredEntry {
    entry: CacheEntry,
    hits: AtomicU64,
}

impl StoredEntry {
    fn snapshot(&self) -> CacheEntry {
        self.entry
            .clone()
            .with_hit_count(self.hits.load(Ordering::Acquire))
    }
}

/// Thread-safe in-memory cache store using moka
///
/// Features:
/// - Fixed per-entry TTL, checked lazily on read and reclaimed by sweeps
/// - Optional LRU bound on entry count
/// - Lock-free hit counting
#[derive(Debug, Clone)]
pub struct InMemoryCacheStore {
    cache: MokaCache<String, Arc<StoredEntry>>,
    config: InMemoryCacheStoreConfig,
}

impl InMemoryCacheStore {
    /// Creates an unbounded store
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheStoreConfig::default())
    }

    /// Creates a store with the given configuration
    pub fn with_config(config: InMemoryCacheStoreConfig) -> Self {
        let cache = match config.max_entries {
            Some(max) => MokaCache::builder()
                .max_capacity(max)
                .eviction_policy(EvictionPolicy::lru())
                .build(),
            None => MokaCache::builder().build(),
        };

        Self { cache, config }
    }

    pub fn config(&self) -> &InMemoryCacheStoreConfig {
        &self.config
    }

    /// Remove the entry under `key` only if it is (still) expired
    async fn remove_if_expired(&self, key: &str) -> bool {
        let now = Utc::now();

        let result = self
            .cache
            .entry(key.to_string())
            .and_compute_with(|current| async move {
                match current {
                    Some(stored) if stored.value().entry.is_expired_at(now) => Op::Remove,
                    _ => Op::Nop,
                }
            })
            .await;

        matches!(result, CompResult::Removed(_))
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, identity_token: &str) -> Result<Option<CacheEntry>, DomainError> {
        let Some(stored) = self.cache.get(identity_token).await else {
            return Ok(None);
        };

        if stored.entry.is_expired() {
            if self.remove_if_expired(identity_token).await {
                debug!(identity_token = %identity_token, "Removed expired cache entry on read");
            }
            return Ok(None);
        }

        Ok(Some(stored.snapshot()))
    }

    async fn put(&self, entry: CacheEntry, ttl: Duration) -> Result<(), DomainError> {
        let entry = entry.expiring_in(ttl);
        let hits = AtomicU64::new(entry.hit_count());
        let key = entry.identity_token().to_string();

        self.cache
            .insert(key, Arc::new(StoredEntry { entry, hits }))
            .await;

        Ok(())
    }

    async fn touch_hit(&self, identity_token: &str) -> Result<Option<u64>, DomainError> {
        let Some(stored) = self.cache.get(identity_token).await else {
            return Ok(None);
        };

        if stored.entry.is_expired() {
            self.remove_if_expired(identity_token).await;
            return Ok(None);
        }

        Ok(Some(stored.hits.fetch_add(1, Ordering::AcqRel) + 1))
    }

    async fn invalidate(&self, identity_token: &str) -> Result<bool, DomainError> {
        Ok(self.cache.remove(identity_token).await.is_some())
    }

    async fn sweep_expired(&self) -> Result<usize, DomainError> {
        let now = Utc::now();

        let expired: Vec<String> = self
            .cache
            .iter()
            .filter(|(_, stored)| stored.entry.is_expired_at(now))
            .map(|(key, _)| key.as_ref().clone())
            .collect();

        let mut removed = 0;

        for key in expired {
            if self.remove_if_expired(&key).await {
                removed += 1;
            }
        }

        self.cache.run_pending_tasks().await;
        Ok(removed)
    }

    async fn size(&self) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count() as usize)
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
