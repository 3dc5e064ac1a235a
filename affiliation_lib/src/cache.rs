//! Report cache: JSON responses kept fresh for a fixed time, shared across tasks.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::error::DashboardError;

/// How long a cached report page stays fresh.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// Concurrent map of serialized responses with time-to-live expiry.
///
/// Expired entries are evicted lazily, on the next read of their key.
pub struct MemoryCache {
    store: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value for `key`, or `None` if missing or stale.
    pub fn get(&self, key: &str) -> Option<String> {
        let entry = self.store.get(key)?;
        if Instant::now() >= entry.expires_at {
            drop(entry);
            self.store.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn set(&self, key: String, value: String) {
        self.store.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Decodes a cached value. A stale or missing key is `Ok(None)`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DashboardError> {
        match self.get(key) {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Stores a value as JSON. Values that fail to serialize are skipped.
    pub fn set_json<T: Serialize>(&self, key: String, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.set(key, json),
            Err(e) => tracing::warn!("not caching {}: {}", key, e),
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn clear(&self) {
        self.store.clear();
    }
}
