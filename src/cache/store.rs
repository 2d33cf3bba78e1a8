//! Response cache facade.
//!
//! [`ResponseCache`] wraps a [`CacheBackend`] and the tag index. It is a best-effort
//! accelerator: backend failures are logged and counted, reads then degrade to a miss and
//! writes to a no-op, so callers never see a cache error.

use std::sync::Arc;

use bytes::Bytes;
use metrics::counter;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::backend::{CacheBackend, CacheError, InMemoryBackend};
use super::config::CacheConfig;
use super::keys::{CacheKey, CacheTag};
use super::registry::{CacheRegistry, Epoch};

pub const METRIC_CACHE_HIT_TOTAL: &str = "catalog_cache_hit_total";
pub const METRIC_CACHE_MISS_TOTAL: &str = "catalog_cache_miss_total";
pub const METRIC_CACHE_INVALIDATED_TOTAL: &str = "catalog_cache_invalidated_total";
pub const METRIC_CACHE_CLEAR_TOTAL: &str = "catalog_cache_clear_total";
pub const METRIC_CACHE_STALE_FILL_TOTAL: &str = "catalog_cache_stale_fill_total";
pub const METRIC_CACHE_BACKEND_ERROR_TOTAL: &str = "catalog_cache_backend_error_total";

/// Outcome of a background sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub purged_entries: usize,
    pub pruned_keys: usize,
}

pub struct ResponseCache {
    config: CacheConfig,
    backend: Arc<dyn CacheBackend>,
    registry: Mutex<CacheRegistry>,
}

impl ResponseCache {
    pub fn new(config: CacheConfig, backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            config,
            backend,
            registry: Mutex::new(CacheRegistry::new()),
        }
    }

    /// Cache backed by the bounded in-memory backend.
    pub fn in_memory(config: CacheConfig) -> Self {
        let backend = Arc::new(InMemoryBackend::new(config.max_entries));
        Self::new(config, backend)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Bytes> {
        if !self.config.enabled {
            return None;
        }

        match self.backend.get(key.as_str()).await {
            Ok(Some(value)) => {
                counter!(METRIC_CACHE_HIT_TOTAL, "tag" => key.tag().as_str()).increment(1);
                debug!(key = %key, "Cache hit");
                Some(value)
            }
            Ok(None) => {
                counter!(METRIC_CACHE_MISS_TOTAL, "tag" => key.tag().as_str()).increment(1);
                debug!(key = %key, "Cache miss");
                None
            }
            Err(err) => {
                record_backend_error("get", &err);
                counter!(METRIC_CACHE_MISS_TOTAL, "tag" => key.tag().as_str()).increment(1);
                None
            }
        }
    }

    /// Current epoch of `tag`; pass it back to [`ResponseCache::populate`].
    pub async fn epoch(&self, tag: CacheTag) -> Epoch {
        self.registry.lock().await.epoch(tag)
    }

    /// Store `value` under `key` for the configured TTL and register it under its tag.
    pub async fn set(&self, key: &CacheKey, value: Bytes) -> bool {
        if !self.config.enabled {
            return false;
        }
        let mut registry = self.registry.lock().await;
        self.store_locked(&mut registry, key, value).await
    }

    /// Like [`ResponseCache::set`], but skipped when the tag was invalidated since
    /// `observed` was read.
    pub async fn populate(&self, key: &CacheKey, value: Bytes, observed: Epoch) -> bool {
        if !self.config.enabled {
            return false;
        }
        let mut registry = self.registry.lock().await;
        let current = registry.epoch(key.tag());
        if current != observed {
            counter!(METRIC_CACHE_STALE_FILL_TOTAL, "tag" => key.tag().as_str()).increment(1);
            debug!(
                key = %key,
                observed_epoch = observed,
                current_epoch = current,
                "Skipped cache fill that raced an invalidation"
            );
            return false;
        }
        self.store_locked(&mut registry, key, value).await
    }

    async fn store_locked(
        &self,
        registry: &mut CacheRegistry,
        key: &CacheKey,
        value: Bytes,
    ) -> bool {
        let now = Instant::now();
        let Some(expires_at) = now.checked_add(self.config.ttl) else {
            record_backend_error(
                "set",
                &CacheError::Backend(format!("ttl of {:?} overflows the clock", self.config.ttl)),
            );
            return false;
        };
        match self
            .backend
            .set(key.as_str(), value, self.config.ttl)
            .await
        {
            Ok(()) => {
                registry.register(key.tag(), key.as_str(), expires_at, now);
                debug!(key = %key, ttl_secs = self.config.ttl.as_secs(), "Cache populated");
                true
            }
            Err(err) => {
                record_backend_error("set", &err);
                false
            }
        }
    }

    pub async fn delete(&self, key: &CacheKey) -> bool {
        let mut registry = self.registry.lock().await;
        registry.unregister(key.tag(), key.as_str());
        match self.backend.delete(key.as_str()).await {
            Ok(removed) => removed,
            Err(err) => {
                record_backend_error("delete", &err);
                false
            }
        }
    }

    /// Drop every live entry registered under `tag`. Returns how many keys were deleted.
    pub async fn invalidate_tag(&self, tag: CacheTag) -> usize {
        let mut registry = self.registry.lock().await;
        let keys = registry.take(tag);
        let mut deleted = 0usize;
        for key in &keys {
            match self.backend.delete(key).await {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(err) => record_backend_error("invalidate", &err),
            }
        }
        counter!(METRIC_CACHE_INVALIDATED_TOTAL, "tag" => tag.as_str()).increment(deleted as u64);
        info!(
            tag = %tag,
            tracked = keys.len(),
            deleted,
            epoch = registry.epoch(tag),
            "Cache tag invalidated"
        );
        deleted
    }

    /// Drop every entry, tagged or not.
    pub async fn clear(&self) {
        let mut registry = self.registry.lock().await;
        registry.clear();
        counter!(METRIC_CACHE_CLEAR_TOTAL).increment(1);
        match self.backend.clear().await {
            Ok(()) => info!("Cache cleared"),
            Err(err) => record_backend_error("clear", &err),
        }
    }

    /// Purge expired entries from the backend and prune the tag index.
    pub async fn sweep(&self) -> SweepStats {
        let purged_entries = match self.backend.purge_expired().await {
            Ok(count) => count,
            Err(err) => {
                record_backend_error("sweep", &err);
                0
            }
        };
        let pruned_keys = self.registry.lock().await.prune(Instant::now());
        let stats = SweepStats {
            purged_entries,
            pruned_keys,
        };
        if purged_entries > 0 || pruned_keys > 0 {
            debug!(purged_entries, pruned_keys, "Cache sweep completed");
        }
        stats
    }

    /// Keys currently tracked for `tag`, sorted.
    pub async fn tracked_keys(&self, tag: CacheTag) -> Vec<String> {
        self.registry.lock().await.keys_for(tag)
    }
}

fn record_backend_error(operation: &'static str, err: &CacheError) {
    counter!(METRIC_CACHE_BACKEND_ERROR_TOTAL, "operation" => operation).increment(1);
    warn!(
        operation,
        error = %err,
        "Cache backend error; continuing without cache"
    );
}
