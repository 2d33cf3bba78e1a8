//! Product list query parameters.
//!
//! Raw query strings are reduced to a [`ProductQueryFilter`]; the filter in turn renders a
//! canonical query string so that equivalent requests share one cache entry. Price bounds
//! accept any decimal and are rounded inward to whole cents.

use thiserror::Error;
use url::form_urlencoded;

use crate::application::repos::{ProductOrdering, ProductQueryFilter};
use crate::domain::price::{DecimalLiteral, PriceBound, PriceError};

pub const CATEGORY_NAME: &str = "category_name";
pub const PRICE_GTE: &str = "price_gte";
pub const PRICE_LTE: &str = "price_lte";
pub const ORDERING: &str = "ordering";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("`{param}` {source}")]
pub struct FilterError {
    pub param: &'static str,
    #[source]
    pub source: PriceError,
}

fn canonical_name(raw: &str) -> Option<&'static str> {
    match raw {
        "category_name" | "category__name" => Some(CATEGORY_NAME),
        "price_gte" | "price__gte" => Some(PRICE_GTE),
        "price_lte" | "price__lte" => Some(PRICE_LTE),
        "ordering" => Some(ORDERING),
        _ => None,
    }
}

/// Build a filter from a raw (still encoded) query string.
///
/// Unknown parameters and empty values are ignored. When a parameter repeats, the last
/// occurrence wins.
pub fn parse_product_filter(raw_query: Option<&str>) -> Result<ProductQueryFilter, FilterError> {
    let mut filter = ProductQueryFilter::default();
    let Some(raw_query) = raw_query else {
        return Ok(filter);
    };

    for (name, value) in form_urlencoded::parse(raw_query.as_bytes()) {
        let Some(param) = canonical_name(&name) else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        match param {
            CATEGORY_NAME => filter.category_name = Some(value.to_string()),
            PRICE_GTE => {
                filter.price_gte = Some(PriceBound::at_least(&parse_bound(PRICE_GTE, value)?))
            }
            PRICE_LTE => {
                filter.price_lte = Some(PriceBound::at_most(&parse_bound(PRICE_LTE, value)?))
            }
            _ => filter.ordering = ProductOrdering::parse(value),
        }
    }

    Ok(filter)
}

fn parse_bound(param: &'static str, value: &str) -> Result<DecimalLiteral, FilterError> {
    DecimalLiteral::parse(value).map_err(|source| FilterError { param, source })
}

/// Render the filter as a form-urlencoded string with parameters sorted by name.
pub fn canonical_query(filter: &ProductQueryFilter) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if let Some(name) = filter.category_name.as_deref() {
        serializer.append_pair(CATEGORY_NAME, name);
    }
    if let Some(ordering) = filter.ordering {
        serializer.append_pair(ORDERING, ordering.as_str());
    }
    if let Some(min) = filter.price_gte {
        serializer.append_pair(PRICE_GTE, &min.to_string());
    }
    if let Some(max) = filter.price_lte {
        serializer.append_pair(PRICE_LTE, &max.to_string());
    }
    serializer.finish()
}
