//! Key-Value Cache Module - the injected user-lookup capability
//!
//! The authentication boundary resolves user records through a read-through
//! cache. The scheduling core never depends on which backing is used - a
//! shared external cache service or a bounded per-process map - only on
//! `get/set/delete` with a TTL. The staleness window is exactly the TTL an
//! entry was written with. The cache is read-only from the core's
//! perspective and never participates in the capacity transaction.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use labsched::kv::{KvCache, MemoryKvCache};
//!
//! # async fn example() -> labsched::Result<()> {
//! let cache = MemoryKvCache::new();
//!
//! cache.set("user:42", b"{\"name\":\"Ada\"}".to_vec()).await?;
//! let value = cache.get("user:42").await?;
//! assert!(value.is_some());
//!
//! cache.delete("user:42").await?;
//! assert!(!cache.exists("user:42").await?);
//! # Ok(())
//! # }
//! ```

mod memory;

pub use memory::MemoryKvCache;

use crate::Result;
use std::future::Future;
use std::time::Duration;

/// Key-value cache capability with per-entry TTL.
pub trait KvCache: Send + Sync {
    /// Get a value by key.
    ///
    /// Returns `None` if the key doesn't exist or its TTL has elapsed.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Set a value with the backend's default TTL.
    ///
    /// Overwrites any existing value.
    fn set(&self, key: &str, value: Vec<u8>) -> impl Future<Output = Result<()>> + Send;

    /// Set a value with an explicit TTL.
    fn set_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete a key.
    ///
    /// No-op if the key doesn't exist.
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Check if a live (non-expired) entry exists for the key.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;
}

/// Read-through lookup: return the cached value if live, otherwise invoke
/// `load`, cache its result under `ttl`, and return it.
///
/// Callers accept staleness up to `ttl` in exchange for skipping the load.
///
/// # Errors
///
/// Propagates cache backend errors and whatever `load` returns.
pub async fn read_through<C, F, Fut>(
    cache: &C,
    key: &str,
    ttl: Duration,
    load: F,
) -> Result<Vec<u8>>
where
    C: KvCache,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<u8>>>,
{
    if let Some(hit) = cache.get(key).await? {
        return Ok(hit);
    }
    let value = load().await?;
    cache.set_with_ttl(key, value.clone(), ttl).await?;
    Ok(value)
}
