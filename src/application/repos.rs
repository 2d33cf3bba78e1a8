//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{CategoryRecord, ProductRecord};
use crate::domain::price::{Price, PriceBound};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSortField {
    Price,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductOrdering {
    pub field: ProductSortField,
    pub descending: bool,
}

impl ProductOrdering {
    /// Parse `price`, `name`, `-price` or `-name`. Anything else yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (descending, name) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let field = match name {
            "price" => ProductSortField::Price,
            "name" => ProductSortField::Name,
            _ => return None,
        };
        Some(Self { field, descending })
    }

    pub fn as_str(&self) -> &'static str {
        match (self.field, self.descending) {
            (ProductSortField::Price, false) => "price",
            (ProductSortField::Price, true) => "-price",
            (ProductSortField::Name, false) => "name",
            (ProductSortField::Name, true) => "-name",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQueryFilter {
    pub category_name: Option<String>,
    pub price_gte: Option<PriceBound>,
    pub price_lte: Option<PriceBound>,
    pub ordering: Option<ProductOrdering>,
}

impl ProductQueryFilter {
    pub fn matches(&self, product: &ProductRecord, category_name: Option<&str>) -> bool {
        if let Some(expected) = self.category_name.as_deref()
            && category_name != Some(expected)
        {
            return false;
        }
        if let Some(min) = self.price_gte
            && product.price.cents() < min.cents()
        {
            return false;
        }
        if let Some(max) = self.price_lte
            && product.price.cents() > max.cents()
        {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct CreateCategoryParams {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateCategoryParams {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateProductParams {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub category_id: i64,
}

#[derive(Debug, Clone)]
pub struct UpdateProductParams {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub category_id: i64,
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    /// All categories ordered by id.
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError>;

    async fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError>;
}

#[async_trait]
pub trait CategoriesWriteRepo: Send + Sync {
    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError>;

    async fn update_category(
        &self,
        params: UpdateCategoryParams,
    ) -> Result<CategoryRecord, RepoError>;

    /// Fails with [`RepoError::Integrity`] while products still reference the category.
    async fn delete_category(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait ProductsRepo: Send + Sync {
    async fn list_products(
        &self,
        filter: &ProductQueryFilter,
    ) -> Result<Vec<ProductRecord>, RepoError>;

    async fn find_product(&self, id: i64) -> Result<Option<ProductRecord>, RepoError>;

    async fn count_by_category(&self, category_id: i64) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait ProductsWriteRepo: Send + Sync {
    /// Fails with [`RepoError::InvalidInput`] when the category does not exist.
    async fn create_product(&self, params: CreateProductParams)
    -> Result<ProductRecord, RepoError>;

    async fn update_product(&self, params: UpdateProductParams)
    -> Result<ProductRecord, RepoError>;

    async fn delete_product(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
