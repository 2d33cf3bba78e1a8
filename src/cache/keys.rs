//! Cache key definitions.
//!
//! Every list response is stored under a [`CacheKey`] that carries the [`CacheTag`] of
//! the family it belongs to, so a write can drop a whole family at once.

use std::fmt;

use crate::application::filter::canonical_query;
use crate::application::repos::ProductQueryFilter;

const CATEGORY_LIST_KEY: &str = "store:categories";
const PRODUCT_LIST_PREFIX: &str = "store:products:";

/// Family of cache entries that share an invalidation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheTag {
    CategoryList,
    ProductList,
}

impl CacheTag {
    pub const ALL: [CacheTag; 2] = [CacheTag::CategoryList, CacheTag::ProductList];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTag::CategoryList => "category_list",
            CacheTag::ProductList => "product_list",
        }
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    tag: CacheTag,
    value: String,
}

impl CacheKey {
    pub fn category_list() -> Self {
        Self {
            tag: CacheTag::CategoryList,
            value: CATEGORY_LIST_KEY.to_string(),
        }
    }

    /// Key for a product list query; equivalent filters produce the same key.
    pub fn product_list(filter: &ProductQueryFilter) -> Self {
        Self {
            tag: CacheTag::ProductList,
            value: format!("{PRODUCT_LIST_PREFIX}{}", canonical_query(filter)),
        }
    }

    pub fn tag(&self) -> CacheTag {
        self.tag
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
