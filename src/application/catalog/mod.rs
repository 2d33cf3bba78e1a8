//! Catalog services: categories and products with cache-aware list reads.

mod categories;
mod products;

pub use categories::{CategoryCommand, CategoryError, CategoryService};
pub use products::{ProductCommand, ProductError, ProductService};

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

const NAME_MAX_CHARS: usize = 255;

pub(crate) const REQUIRED: &str = "this field is required";
pub(crate) const BLANK: &str = "this field may not be blank";

/// A rejected input field and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Non-empty list of field violations for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldViolation::new(field, message));
    }

    pub fn extend(&mut self, other: Violations) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldViolation] {
        &self.0
    }

    pub fn into_fields(self) -> Vec<FieldViolation> {
        self.0
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut violations = Self::new();
        violations.push(field, message);
        violations
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), Violations> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|violation| format!("{}: {}", violation.field, violation.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Whether an update must carry every required field or only the ones it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Replace,
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
        }
    }
}

/// Serialized list response, served verbatim from or into the cache.
#[derive(Debug, Clone)]
pub struct ListPayload {
    pub body: Bytes,
    pub cache: CacheStatus,
}

pub(crate) fn normalize_name(
    raw: Option<String>,
    required: bool,
    violations: &mut Violations,
) -> Option<String> {
    let Some(raw) = raw else {
        if required {
            violations.push("name", REQUIRED);
        }
        return None;
    };
    let name = raw.trim();
    if name.is_empty() {
        violations.push("name", BLANK);
        return None;
    }
    if name.chars().count() > NAME_MAX_CHARS {
        violations.push(
            "name",
            format!("ensure this field has no more than {NAME_MAX_CHARS} characters"),
        );
        return None;
    }
    Some(name.to_string())
}

pub(crate) fn normalize_description(raw: Option<String>) -> Option<String> {
    raw.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
