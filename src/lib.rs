//! Catalog service: categories and products over HTTP with a filter-aware list cache.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
