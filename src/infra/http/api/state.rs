use std::sync::Arc;

use crate::application::catalog::{CategoryService, ProductService};
use crate::application::repos::{
    CategoriesRepo, CategoriesWriteRepo, ProductsRepo, ProductsWriteRepo, StoreHealth,
};
use crate::cache::{CacheTrigger, ResponseCache};

#[derive(Clone)]
pub struct ApiState {
    pub categories: Arc<CategoryService>,
    pub products: Arc<ProductService>,
    pub store: Arc<dyn StoreHealth>,
    pub cache: Arc<ResponseCache>,
}

impl ApiState {
    /// Wire both services against one store and one cache.
    pub fn from_store<S>(store: Arc<S>, cache: Arc<ResponseCache>) -> Self
    where
        S: CategoriesRepo
            + CategoriesWriteRepo
            + ProductsRepo
            + ProductsWriteRepo
            + StoreHealth
            + 'static,
    {
        let trigger = Arc::new(CacheTrigger::new(cache.clone()));
        let categories = CategoryService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            cache.clone(),
            trigger.clone(),
        );
        let products = ProductService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            cache.clone(),
            trigger,
        );

        Self {
            categories: Arc::new(categories),
            products: Arc::new(products),
            store,
            cache,
        }
    }
}
