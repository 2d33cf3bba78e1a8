//! Cache events raised by catalog writes.

use time::OffsetDateTime;
use uuid::Uuid;

/// A single write that may affect cached list responses.
#[derive(Debug, Clone)]
pub struct CacheEvent {
    /// Correlates the log lines of one invalidation.
    pub id: Uuid,
    pub kind: EventKind,
    pub timestamp: OffsetDateTime,
}

impl CacheEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    CategoryCreated { category_id: i64 },
    CategoryUpdated { category_id: i64 },
    CategoryDeleted { category_id: i64 },
    ProductCreated { product_id: i64 },
    ProductUpdated { product_id: i64 },
    ProductDeleted { product_id: i64 },
}

impl EventKind {
    pub fn is_category_write(&self) -> bool {
        matches!(
            self,
            EventKind::CategoryCreated { .. }
                | EventKind::CategoryUpdated { .. }
                | EventKind::CategoryDeleted { .. }
        )
    }
}
