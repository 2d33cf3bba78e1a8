//! Process-local repository implementation.
//!
//! Used when no database URL is configured and by the test suite. All state sits behind
//! one `tokio::sync::RwLock`, so each write (including the foreign-key checks it performs)
//! is atomic with respect to every other operation. Nothing survives a restart.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::application::repos::{
    CategoriesRepo, CategoriesWriteRepo, CreateCategoryParams, CreateProductParams,
    ProductOrdering, ProductQueryFilter, ProductSortField, ProductsRepo, ProductsWriteRepo,
    RepoError, StoreHealth, UpdateCategoryParams, UpdateProductParams,
};
use crate::domain::entities::{CategoryRecord, ProductRecord};

#[derive(Debug, Default)]
struct State {
    last_category_id: i64,
    last_product_id: i64,
    categories: BTreeMap<i64, CategoryRecord>,
    products: BTreeMap<i64, ProductRecord>,
}

impl State {
    fn ensure_category(&self, category_id: i64) -> Result<(), RepoError> {
        if self.categories.contains_key(&category_id) {
            Ok(())
        } else {
            Err(RepoError::InvalidInput {
                message: format!("category {category_id} does not exist"),
            })
        }
    }

    fn category_name(&self, category_id: i64) -> Option<&str> {
        self.categories
            .get(&category_id)
            .map(|category| category.name.as_str())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRepositories {
    state: RwLock<State>,
}

impl InMemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare_products(
    left: &ProductRecord,
    right: &ProductRecord,
    ordering: Option<ProductOrdering>,
) -> Ordering {
    let primary = match ordering {
        None => Ordering::Equal,
        Some(ordering) => {
            let by_field = match ordering.field {
                ProductSortField::Price => left.price.cmp(&right.price),
                ProductSortField::Name => left.name.cmp(&right.name),
            };
            if ordering.descending {
                by_field.reverse()
            } else {
                by_field
            }
        }
    };
    primary.then(left.id.cmp(&right.id))
}

#[async_trait]
impl CategoriesRepo for InMemoryRepositories {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        Ok(self.state.read().await.categories.values().cloned().collect())
    }

    async fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError> {
        Ok(self.state.read().await.categories.get(&id).cloned())
    }
}

#[async_trait]
impl CategoriesWriteRepo for InMemoryRepositories {
    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        let mut state = self.state.write().await;
        state.last_category_id += 1;
        let category = CategoryRecord {
            id: state.last_category_id,
            name: params.name,
            description: params.description,
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        params: UpdateCategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        let mut state = self.state.write().await;
        let category = state
            .categories
            .get_mut(&params.id)
            .ok_or(RepoError::NotFound)?;
        category.name = params.name;
        category.description = params.description;
        Ok(category.clone())
    }

    async fn delete_category(&self, id: i64) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        if !state.categories.contains_key(&id) {
            return Err(RepoError::NotFound);
        }
        let dependents = state
            .products
            .values()
            .filter(|product| product.category_id == id)
            .count();
        if dependents > 0 {
            return Err(RepoError::Integrity {
                message: format!("category {id} is still referenced by {dependents} products"),
            });
        }
        state.categories.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ProductsRepo for InMemoryRepositories {
    async fn list_products(
        &self,
        filter: &ProductQueryFilter,
    ) -> Result<Vec<ProductRecord>, RepoError> {
        let state = self.state.read().await;
        let mut products: Vec<ProductRecord> = state
            .products
            .values()
            .filter(|product| filter.matches(product, state.category_name(product.category_id)))
            .cloned()
            .collect();
        products.sort_by(|left, right| compare_products(left, right, filter.ordering));
        Ok(products)
    }

    async fn find_product(&self, id: i64) -> Result<Option<ProductRecord>, RepoError> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn count_by_category(&self, category_id: i64) -> Result<u64, RepoError> {
        let count = self
            .state
            .read()
            .await
            .products
            .values()
            .filter(|product| product.category_id == category_id)
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl ProductsWriteRepo for InMemoryRepositories {
    async fn create_product(
        &self,
        params: CreateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        let mut state = self.state.write().await;
        state.ensure_category(params.category_id)?;

        state.last_product_id += 1;
        let now = OffsetDateTime::now_utc();
        let product = ProductRecord {
            id: state.last_product_id,
            name: params.name,
            description: params.description,
            price: params.price,
            category_id: params.category_id,
            created_at: now,
            updated_at: now,
        };
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        params: UpdateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        let mut state = self.state.write().await;
        if !state.products.contains_key(&params.id) {
            return Err(RepoError::NotFound);
        }
        state.ensure_category(params.category_id)?;

        let product = state
            .products
            .get_mut(&params.id)
            .ok_or(RepoError::NotFound)?;
        product.name = params.name;
        product.description = params.description;
        product.price = params.price;
        product.category_id = params.category_id;
        product.updated_at = OffsetDateTime::now_utc();
        Ok(product.clone())
    }

    async fn delete_product(&self, id: i64) -> Result<(), RepoError> {
        self.state
            .write()
            .await
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl StoreHealth for InMemoryRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}
