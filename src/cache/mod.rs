//! Catalog response cache.
//!
//! List endpoints store their serialized payloads here, keyed by a canonical form of the
//! request's filters. Writes invalidate through [`CacheTrigger`]:
//!
//! - category writes clear the whole cache
//! - product writes drop only product-list entries
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 300
//! max_entries = 1024
//! sweep_interval_secs = 60
//! ```

mod backend;
mod config;
mod events;
mod keys;
mod planner;
mod registry;
mod store;
mod trigger;

pub use backend::{CacheBackend, CacheError, InMemoryBackend};
pub use config::CacheConfig;
pub use events::{CacheEvent, EventKind};
pub use keys::{CacheKey, CacheTag};
pub use planner::InvalidationPlan;
pub use registry::{CacheRegistry, Epoch};
pub use store::{ResponseCache, SweepStats};
pub use trigger::CacheTrigger;

/// Metric names emitted by the cache, described at start-up.
pub mod metric_names {
    pub use super::backend::METRIC_CACHE_EVICT_TOTAL;
    pub use super::store::{
        METRIC_CACHE_BACKEND_ERROR_TOTAL, METRIC_CACHE_CLEAR_TOTAL, METRIC_CACHE_HIT_TOTAL,
        METRIC_CACHE_INVALIDATED_TOTAL, METRIC_CACHE_MISS_TOTAL, METRIC_CACHE_STALE_FILL_TOTAL,
    };
}
