use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info};

use crate::application::catalog::{
    CacheStatus, ListPayload, Violations, WriteMode, normalize_description, normalize_name,
};
use crate::application::repos::{
    CategoriesRepo, CategoriesWriteRepo, CreateCategoryParams, ProductsRepo, RepoError,
    UpdateCategoryParams,
};
use crate::cache::{CacheKey, CacheTrigger, ResponseCache};
use crate::domain::entities::CategoryRecord;

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("category not found")]
    NotFound,
    #[error("invalid category: {0}")]
    Invalid(Violations),
    #[error("category is referenced by {count} products")]
    InUse { count: u64 },
    #[error("failed to encode category list: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Category fields as supplied by a client. `description` distinguishes an absent field
/// (`None`) from an explicit null (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct CategoryCommand {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

#[derive(Clone)]
pub struct CategoryService {
    reader: Arc<dyn CategoriesRepo>,
    writer: Arc<dyn CategoriesWriteRepo>,
    products: Arc<dyn ProductsRepo>,
    cache: Arc<ResponseCache>,
    trigger: Arc<CacheTrigger>,
}

impl CategoryService {
    pub fn new(
        reader: Arc<dyn CategoriesRepo>,
        writer: Arc<dyn CategoriesWriteRepo>,
        products: Arc<dyn ProductsRepo>,
        cache: Arc<ResponseCache>,
        trigger: Arc<CacheTrigger>,
    ) -> Self {
        Self {
            reader,
            writer,
            products,
            cache,
            trigger,
        }
    }

    /// Serialized list of all categories, served from the cache when possible.
    pub async fn list(&self) -> Result<ListPayload, CategoryError> {
        let key = CacheKey::category_list();
        if let Some(body) = self.cache.get(&key).await {
            return Ok(ListPayload {
                body,
                cache: CacheStatus::Hit,
            });
        }

        let epoch = self.cache.epoch(key.tag()).await;
        let categories = self.reader.list_categories().await?;
        let body = Bytes::from(serde_json::to_vec(&categories)?);
        self.cache.populate(&key, body.clone(), epoch).await;
        debug!(count = categories.len(), "Category list loaded from store");

        Ok(ListPayload {
            body,
            cache: CacheStatus::Miss,
        })
    }

    pub async fn get(&self, id: i64) -> Result<CategoryRecord, CategoryError> {
        self.reader
            .find_category(id)
            .await?
            .ok_or(CategoryError::NotFound)
    }

    pub async fn create(&self, command: CategoryCommand) -> Result<CategoryRecord, CategoryError> {
        let mut violations = Violations::new();
        let name = normalize_name(command.name, true, &mut violations);
        violations.into_result().map_err(CategoryError::Invalid)?;
        let Some(name) = name else {
            return Err(CategoryError::Invalid(Violations::single(
                "name",
                super::REQUIRED,
            )));
        };

        let category = self
            .writer
            .create_category(CreateCategoryParams {
                name,
                description: normalize_description(command.description.flatten()),
            })
            .await?;

        info!(category_id = category.id, "Category created");
        self.trigger.category_created(category.id).await;
        Ok(category)
    }

    pub async fn update(
        &self,
        id: i64,
        command: CategoryCommand,
        mode: WriteMode,
    ) -> Result<CategoryRecord, CategoryError> {
        let existing = self.get(id).await?;

        let mut violations = Violations::new();
        let name = normalize_name(command.name, mode == WriteMode::Replace, &mut violations);
        violations.into_result().map_err(CategoryError::Invalid)?;

        let description = match command.description {
            Some(value) => normalize_description(value),
            None => existing.description,
        };

        let category = self
            .writer
            .update_category(UpdateCategoryParams {
                id,
                name: name.unwrap_or(existing.name),
                description,
            })
            .await
            .map_err(|err| match err {
                RepoError::NotFound => CategoryError::NotFound,
                other => CategoryError::Repo(other),
            })?;

        info!(category_id = id, "Category updated");
        self.trigger.category_updated(id).await;
        Ok(category)
    }

    /// Delete a category that no product references.
    pub async fn delete(&self, id: i64) -> Result<(), CategoryError> {
        self.get(id).await?;

        let count = self.products.count_by_category(id).await?;
        if count > 0 {
            return Err(CategoryError::InUse { count });
        }

        match self.writer.delete_category(id).await {
            Ok(()) => {}
            Err(RepoError::NotFound) => return Err(CategoryError::NotFound),
            Err(RepoError::Integrity { .. }) => {
                let count = self.products.count_by_category(id).await?;
                return Err(CategoryError::InUse { count });
            }
            Err(err) => return Err(err.into()),
        }

        info!(category_id = id, "Category deleted");
        self.trigger.category_deleted(id).await;
        Ok(())
    }
}
