//! Cache trigger service.
//!
//! Write paths call the trigger after a successful mutation; it turns the write into a
//! [`CacheEvent`], plans the invalidation and executes it before the response goes out.

use std::sync::Arc;

use tracing::info;

use super::events::{CacheEvent, EventKind};
use super::planner::InvalidationPlan;
use super::store::ResponseCache;

pub struct CacheTrigger {
    cache: Arc<ResponseCache>,
}

impl CacheTrigger {
    pub fn new(cache: Arc<ResponseCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Invalidate the entries affected by `kind`.
    ///
    /// Runs even when the cache is disabled so that epochs keep moving.
    pub async fn trigger(&self, kind: EventKind) -> InvalidationPlan {
        let event = CacheEvent::new(kind);
        let plan = InvalidationPlan::from_events(std::slice::from_ref(&event));

        info!(
            event_id = %event.id,
            event_kind = ?event.kind,
            plan = %plan,
            "Cache invalidation planned"
        );

        if plan.clear_all {
            self.cache.clear().await;
        } else {
            for tag in &plan.tags {
                self.cache.invalidate_tag(*tag).await;
            }
        }

        plan
    }

    pub async fn category_created(&self, category_id: i64) {
        self.trigger(EventKind::CategoryCreated { category_id }).await;
    }

    pub async fn category_updated(&self, category_id: i64) {
        self.trigger(EventKind::CategoryUpdated { category_id }).await;
    }

    pub async fn category_deleted(&self, category_id: i64) {
        self.trigger(EventKind::CategoryDeleted { category_id }).await;
    }

    pub async fn product_created(&self, product_id: i64) {
        self.trigger(EventKind::ProductCreated { product_id }).await;
    }

    pub async fn product_updated(&self, product_id: i64) {
        self.trigger(EventKind::ProductUpdated { product_id }).await;
    }

    pub async fn product_deleted(&self, product_id: i64) {
        self.trigger(EventKind::ProductDeleted { product_id }).await;
    }
}
