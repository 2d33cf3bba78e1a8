//! Invalidation plan generation.
//!
//! Category writes clear the whole cache, since category data can surface in any list.
//! Product writes only touch product lists.

use std::collections::BTreeSet;
use std::fmt;

use super::events::CacheEvent;
use super::keys::CacheTag;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct InvalidationPlan {
    pub clear_all: bool,
    pub tags: BTreeSet<CacheTag>,
}

impl fmt::Display for InvalidationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clear_all {
            return f.write_str("InvalidationPlan { clear_all }");
        }
        let tags: Vec<&str> = self.tags.iter().map(CacheTag::as_str).collect();
        write!(f, "InvalidationPlan {{ tags: [{}] }}", tags.join(", "))
    }
}

impl InvalidationPlan {
    /// Merge events into one plan. A full clear subsumes any tag invalidation.
    pub fn from_events(events: &[CacheEvent]) -> Self {
        let mut plan = Self::default();
        for event in events {
            if event.kind.is_category_write() {
                plan.clear_all = true;
            } else {
                plan.tags.insert(CacheTag::ProductList);
            }
        }
        if plan.clear_all {
            plan.tags.clear();
        }
        plan
    }

    pub fn is_empty(&self) -> bool {
        !self.clear_all && self.tags.is_empty()
    }
}
