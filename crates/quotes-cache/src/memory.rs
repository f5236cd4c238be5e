//! In-memory TTL cache implementation.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Cache entry with write timestamp and per-entry TTL.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    written_at: DateTime<Utc>,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            written_at: Utc::now(),
            ttl,
        }
    }

    fn is_stale(&self) -> bool {
        let age = Utc::now().signed_duration_since(self.written_at);
        age > chrono::TimeDelta::from_std(self.ttl).unwrap_or(chrono::TimeDelta::MAX)
    }
}

/// Simple in-memory cache with per-entry TTL.
///
/// Entries are stored in an `RwLock`-protected `HashMap` and expire lazily:
/// a read past `written_at + ttl` is a miss even though the entry may still
/// be physically present. Values are cloned on get, so callers never hold
/// references into the cache's internal storage. Writes are
/// last-write-wins.
#[derive(Debug, Default)]
pub struct TtlCache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
}

impl<T: Clone + Send + Sync> TtlCache<T> {
    /// Create a new empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a clone of the cached value, or `None` on miss or expiry.
    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if !entry.is_stale() => {
                debug!("Cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!("Cache entry expired");
                None
            }
            None => {
                debug!("Cache miss");
                None
            }
        }
    }

    /// Returns when the live entry for `key` was written, if any.
    pub async fn written_at(&self, key: &str) -> Option<DateTime<Utc>> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| !entry.is_stale())
            .map(|entry| entry.written_at)
    }

    /// Stores a value under `key`, overwriting any previous entry.
    #[instrument(skip(self, value))]
    pub async fn set(&self, key: impl Into<String> + std::fmt::Debug, value: T, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(key.into(), CacheEntry::new(value, ttl));
    }

    /// Number of physically present entries, including expired ones.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if the cache holds no entries at all.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Removes expired entries and returns how many were dropped.
    ///
    /// Purely an optimization: expiry is already enforced lazily on read.
    #[instrument(skip(self))]
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_stale());
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Purged {} expired cache entries", removed);
        }
        removed
    }

    /// Clears all cached entries.
    #[instrument(skip(self))]
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        debug!("Cleared all cache entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip() {
        let cache = TtlCache::new();

        assert!(cache.get("quote:AAPL").await.is_none());

        cache
            .set("quote:AAPL", 185.7_f64, Duration::from_secs(60))
            .await;
        assert_eq!(cache.get("quote:AAPL").await, Some(185.7));
        assert!(cache.written_at("quote:AAPL").await.is_some());
    }

    #[tokio::test]
    async fn expires_after_ttl() {
        let cache = TtlCache::new();
        cache
            .set("quote:AAPL", 185.7_f64, Duration::from_millis(20))
            .await;
        assert!(cache.get("quote:AAPL").await.is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get("quote:AAPL").await.is_none());
        assert!(cache.written_at("quote:AAPL").await.is_none());
        // lazy expiry: the entry is still physically present
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn overwrite_is_last_write_wins() {
        let cache = TtlCache::new();
        cache.set("k", 1_u32, Duration::from_secs(60)).await;
        cache.set("k", 2_u32, Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await, Some(2));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn purge_drops_only_expired() {
        let cache = TtlCache::new();
        cache.set("old", 1_u32, Duration::from_millis(10)).await;
        cache.set("new", 2_u32, Duration::from_secs(60)).await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("new").await, Some(2));
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let cache = TtlCache::new();
        cache.set("k", 1_u32, Duration::from_secs(60)).await;
        cache.clear().await;
        assert!(cache.is_empty().await);
        assert!(cache.get("k").await.is_none());
    }
}
