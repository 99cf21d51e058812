//! Bounded in-memory cache implementation using `DashMap`.
//!
//! Entries expire lazily: an expired entry is dropped on the next access.
//! The map is bounded; when full, inserting a new key first purges expired
//! entries and then evicts the entry closest to expiry.

use super::KvCache;
use crate::Result;
use dashmap::DashMap;
use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(300);
const DEFAULT_MAX_ENTRIES: usize = 10_000;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// Bounded in-memory key-value cache with per-entry TTL.
///
/// Thread-safe; suitable for a single-process deployment. A shared
/// deployment would back [`KvCache`] with an external cache service
/// instead - callers cannot tell the difference.
pub struct MemoryKvCache {
    store: DashMap<String, CacheEntry>,
    default_ttl: Duration,
    max_entries: usize,
}

impl MemoryKvCache {
    /// Create a cache with the default TTL (5 minutes) and entry bound.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }

    /// Create a cache with an explicit default TTL and entry bound.
    ///
    /// A zero `max_entries` is treated as 1.
    #[must_use]
    pub fn with_config(default_ttl: Duration, max_entries: usize) -> Self {
        Self {
            store: DashMap::new(),
            default_ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Get the number of entries, including not-yet-purged expired ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.store.clear();
    }

    fn insert(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        let now = Instant::now();
        if !self.store.contains_key(key) && self.store.len() >= self.max_entries {
            self.store.retain(|_, entry| !entry.is_expired(now));
            if self.store.len() >= self.max_entries {
                self.evict_soonest_to_expire();
            }
        }
        self.store.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    fn evict_soonest_to_expire(&self) {
        let victim = self
            .store
            .iter()
            .min_by_key(|entry| entry.value().expires_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = victim {
            self.store.remove(&key);
        }
    }
}

impl Default for MemoryKvCache {
    fn default() -> Self {
        Self::new()
    }
}

impl KvCache for MemoryKvCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired(now) {
                return Ok(Some(entry.value.clone()));
            }
        }
        // Lazy expiry: drop the stale entry on access.
        self.store.remove_if(key, |_, entry| entry.is_expired(now));
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.insert(key, value, self.default_ttl);
        Ok(())
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.insert(key, value, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
