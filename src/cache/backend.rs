//! Cache storage backends.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use metrics::counter;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

pub const METRIC_CACHE_EVICT_TOTAL: &str = "catalog_cache_evict_total";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache backend failure: {0}")]
    Backend(String),
}

/// Key-value storage for serialized list payloads with per-entry expiry.
///
/// Implementations must never return an entry past its expiry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError>;

    /// Returns whether an entry was removed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    async fn clear(&self) -> Result<(), CacheError>;

    /// Drop expired entries, returning how many were removed.
    async fn purge_expired(&self) -> Result<usize, CacheError>;
}

#[derive(Debug, Clone)]
struct Entry {
    value: Bytes,
    expires_at: Instant,
}

/// Process-local backend bounded to `max_entries` live entries.
pub struct InMemoryBackend {
    entries: DashMap<String, Entry>,
    max_entries: usize,
}

impl InMemoryBackend {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    fn make_room(&self, now: Instant) {
        if self.entries.len() < self.max_entries {
            return;
        }
        let purged = self.purge_expired_at(now);
        if purged > 0 {
            debug!(purged, "Purged expired cache entries to make room");
        }

        while self.entries.len() >= self.max_entries {
            let victim = self
                .entries
                .iter()
                .min_by_key(|item| item.value().expires_at)
                .map(|item| item.key().clone());
            let Some(victim) = victim else {
                break;
            };
            if self.entries.remove(&victim).is_some() {
                counter!(METRIC_CACHE_EVICT_TOTAL).increment(1);
                debug!(key = %victim, "Evicted cache entry closest to expiry");
            }
        }
    }
}

#[async_trait]
impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
            Some(_) => {}
            None => return Ok(None),
        }
        self.entries
            .remove_if(key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| CacheError::Backend(format!("ttl of {ttl:?} overflows the clock")))?;
        if !self.entries.contains_key(key) {
            self.make_room(now);
        }
        self.entries
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.clear();
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        Ok(self.purge_expired_at(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test(start_paused = true)]
    async fn entries_are_not_served_past_expiry() {
        let backend = InMemoryBackend::new(8);
        backend
            .set("store:categories", Bytes::from_static(b"[]"), TTL)
            .await
            .unwrap();

        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        assert_eq!(
            backend.get("store:categories").await.unwrap(),
            Some(Bytes::from_static(b"[]"))
        );

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(backend.get("store:categories").await.unwrap(), None);
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn unrepresentable_expiry_is_an_error() {
        let backend = InMemoryBackend::new(8);
        let err = backend
            .set("store:categories", Bytes::from_static(b"[]"), Duration::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Backend(_)));
        assert!(backend.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn overflow_purges_expired_entries_first() {
        let backend = InMemoryBackend::new(2);
        backend
            .set("short", Bytes::from_static(b"1"), Duration::from_secs(10))
            .await
            .unwrap();
        backend.set("long", Bytes::from_static(b"2"), TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;
        backend.set("fresh", Bytes::from_static(b"3"), TTL).await.unwrap();

        assert_eq!(backend.len(), 2);
        assert!(backend.get("long").await.unwrap().is_some());
        assert!(backend.get("fresh").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn overflow_evicts_entry_closest_to_expiry() {
        let backend = InMemoryBackend::new(2);
        backend.set("older", Bytes::from_static(b"1"), TTL).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        backend.set("newer", Bytes::from_static(b"2"), TTL).await.unwrap();
        backend.set("third", Bytes::from_static(b"3"), TTL).await.unwrap();

        assert_eq!(backend.len(), 2);
        assert!(backend.get("older").await.unwrap().is_none());
        assert!(backend.get("newer").await.unwrap().is_some());
        assert!(backend.get("third").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn overwriting_an_existing_key_never_evicts() {
        let backend = InMemoryBackend::new(1);
        backend.set("only", Bytes::from_static(b"1"), TTL).await.unwrap();
        backend.set("only", Bytes::from_static(b"2"), TTL).await.unwrap();
        assert_eq!(
            backend.get("only").await.unwrap(),
            Some(Bytes::from_static(b"2"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn purge_expired_reports_removed_count() {
        let backend = InMemoryBackend::new(8);
        backend
            .set("a", Bytes::from_static(b"1"), Duration::from_secs(1))
            .await
            .unwrap();
        backend.set("b", Bytes::from_static(b"2"), TTL).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(backend.purge_expired().await.unwrap(), 1);
        assert!(!backend.delete("a").await.unwrap());
        assert!(backend.delete("b").await.unwrap());
    }
}
