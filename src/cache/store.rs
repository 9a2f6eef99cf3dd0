//! Key/value backends holding rendered widget HTML.
//!
//! [`CacheStore`] is the seam to whatever shared cache service the host runs.
//! [`MemoryStore`] keeps entries in a bounded LRU with passive TTL expiry;
//! [`NullStore`] never holds anything.

use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
    #[error("cache store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// External key/value service shared across widget instances.
///
/// Implementations must make each call atomic for its key; no cross-key
/// transactions are expected.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    async fn write(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// A stored render result.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub value: Bytes,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process store with LRU eviction.
///
/// Expiry is checked when an entry is read; nothing sweeps in the background.
pub struct MemoryStore {
    entries: RwLock<LruCache<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries_non_zero())
    }

    /// Number of held entries, expired ones included.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        rw_read(&self.entries, SOURCE, "contains").contains(key)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "read");

        match entries.get(key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired_at(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
        }

        entries.pop(key);
        debug!(cache_key = key, "Dropped expired render cache entry");
        Ok(None)
    }

    async fn write(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| StoreError::backend(format!("ttl {ttl:?} is out of range")))?;

        let entry = CacheEntry {
            key: key.to_string(),
            value,
            expires_at,
        };

        let evicted = rw_write(&self.entries, SOURCE, "write").push(key.to_string(), entry);
        if let Some((evicted_key, _)) = evicted.filter(|(evicted_key, _)| evicted_key != key) {
            debug!(cache_key = %evicted_key, "Evicted render cache entry at capacity");
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        rw_write(&self.entries, SOURCE, "delete").pop(key);
        Ok(())
    }
}

/// Store that never holds entries; every read misses.
pub struct NullStore;

#[async_trait]
impl CacheStore for NullStore {
    async fn read(&self, _key: &str) -> Result<Option<Bytes>, StoreError> {
        Ok(None)
    }

    async fn write(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), StoreError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }
}
