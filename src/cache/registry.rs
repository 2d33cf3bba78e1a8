//! Tag index for cache invalidation.
//!
//! Tracks which live cache keys belong to each [`CacheTag`], together with their expiry,
//! and a per-tag epoch that moves every time the tag is invalidated.

use std::collections::HashMap;

use tokio::time::Instant;

use super::keys::CacheTag;

/// Counter bumped whenever a tag is invalidated.
pub type Epoch = u64;

#[derive(Debug, Default)]
struct TagEntry {
    epoch: Epoch,
    keys: HashMap<String, Instant>,
}

impl TagEntry {
    fn prune(&mut self, now: Instant) -> usize {
        let before = self.keys.len();
        self.keys.retain(|_, expires_at| *expires_at > now);
        before - self.keys.len()
    }
}

/// Not synchronised; the owning cache guards it with an async mutex.
#[derive(Debug, Default)]
pub struct CacheRegistry {
    tags: HashMap<CacheTag, TagEntry>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self, tag: CacheTag) -> Epoch {
        self.tags.get(&tag).map_or(0, |entry| entry.epoch)
    }

    /// Record `key` under `tag`, pruning keys of that tag that expired by `now`.
    ///
    /// Registering a key twice only refreshes its expiry.
    pub fn register(&mut self, tag: CacheTag, key: &str, expires_at: Instant, now: Instant) {
        let entry = self.tags.entry(tag).or_default();
        entry.prune(now);
        entry.keys.insert(key.to_string(), expires_at);
    }

    pub fn unregister(&mut self, tag: CacheTag, key: &str) {
        if let Some(entry) = self.tags.get_mut(&tag) {
            entry.keys.remove(key);
        }
    }

    /// Bump the epoch of `tag` and hand back every key it tracked.
    pub fn take(&mut self, tag: CacheTag) -> Vec<String> {
        let entry = self.tags.entry(tag).or_default();
        entry.epoch += 1;
        entry.keys.drain().map(|(key, _)| key).collect()
    }

    /// Forget every key and bump every epoch.
    pub fn clear(&mut self) {
        for tag in CacheTag::ALL {
            let entry = self.tags.entry(tag).or_default();
            entry.epoch += 1;
            entry.keys.clear();
        }
    }

    /// Drop expired keys across all tags.
    pub fn prune(&mut self, now: Instant) -> usize {
        self.tags.values_mut().map(|entry| entry.prune(now)).sum()
    }

    pub fn key_count(&self) -> usize {
        self.tags.values().map(|entry| entry.keys.len()).sum()
    }

    pub fn keys_for(&self, tag: CacheTag) -> Vec<String> {
        let mut keys: Vec<String> = self
            .tags
            .get(&tag)
            .map(|entry| entry.keys.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}
