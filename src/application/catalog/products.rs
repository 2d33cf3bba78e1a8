use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info};

use crate::application::catalog::{
    CacheStatus, ListPayload, REQUIRED, Violations, WriteMode, normalize_description,
    normalize_name,
};
use crate::application::filter::{FilterError, parse_product_filter};
use crate::application::repos::{
    CategoriesRepo, CreateProductParams, ProductsRepo, ProductsWriteRepo, RepoError,
    UpdateProductParams,
};
use crate::cache::{CacheKey, CacheTrigger, ResponseCache};
use crate::domain::entities::ProductRecord;
use crate::domain::price::Price;

const CATEGORY_FIELD: &str = "category_id";

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("product not found")]
    NotFound,
    #[error("invalid product: {0}")]
    Invalid(Violations),
    #[error("invalid product filter: {0}")]
    Filter(#[from] FilterError),
    #[error("failed to encode product list: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Product fields as supplied by a client, already type-checked.
#[derive(Debug, Clone, Default)]
pub struct ProductCommand {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<Price>,
    pub category_id: Option<i64>,
}

#[derive(Clone)]
pub struct ProductService {
    reader: Arc<dyn ProductsRepo>,
    writer: Arc<dyn ProductsWriteRepo>,
    categories: Arc<dyn CategoriesRepo>,
    cache: Arc<ResponseCache>,
    trigger: Arc<CacheTrigger>,
}

impl ProductService {
    pub fn new(
        reader: Arc<dyn ProductsRepo>,
        writer: Arc<dyn ProductsWriteRepo>,
        categories: Arc<dyn CategoriesRepo>,
        cache: Arc<ResponseCache>,
        trigger: Arc<CacheTrigger>,
    ) -> Self {
        Self {
            reader,
            writer,
            categories,
            cache,
            trigger,
        }
    }

    /// Serialized product list for a raw query string.
    ///
    /// Equivalent queries share one cache entry; a fill that races a product write is
    /// served but not cached.
    pub async fn list(&self, raw_query: Option<&str>) -> Result<ListPayload, ProductError> {
        let filter = parse_product_filter(raw_query)?;
        let key = CacheKey::product_list(&filter);

        if let Some(body) = self.cache.get(&key).await {
            return Ok(ListPayload {
                body,
                cache: CacheStatus::Hit,
            });
        }

        let epoch = self.cache.epoch(key.tag()).await;
        let products = self.reader.list_products(&filter).await?;
        let body = Bytes::from(serde_json::to_vec(&products)?);
        self.cache.populate(&key, body.clone(), epoch).await;
        debug!(key = %key, count = products.len(), "Product list loaded from store");

        Ok(ListPayload {
            body,
            cache: CacheStatus::Miss,
        })
    }

    pub async fn get(&self, id: i64) -> Result<ProductRecord, ProductError> {
        self.reader
            .find_product(id)
            .await?
            .ok_or(ProductError::NotFound)
    }

    pub async fn create(&self, command: ProductCommand) -> Result<ProductRecord, ProductError> {
        let mut violations = Violations::new();
        let name = normalize_name(command.name, true, &mut violations);
        if command.price.is_none() {
            violations.push("price", REQUIRED);
        }
        match command.category_id {
            Some(category_id) => self.check_category(category_id, &mut violations).await?,
            None => violations.push(CATEGORY_FIELD, REQUIRED),
        }
        violations.into_result().map_err(ProductError::Invalid)?;

        let (Some(name), Some(price), Some(category_id)) =
            (name, command.price, command.category_id)
        else {
            return Err(ProductError::Invalid(Violations::single("name", REQUIRED)));
        };

        let product = self
            .writer
            .create_product(CreateProductParams {
                name,
                description: normalize_description(command.description.flatten()),
                price,
                category_id,
            })
            .await
            .map_err(|err| map_write_error(err, category_id))?;

        info!(
            product_id = product.id,
            category_id = product.category_id,
            "Product created"
        );
        self.trigger.product_created(product.id).await;
        Ok(product)
    }

    pub async fn update(
        &self,
        id: i64,
        command: ProductCommand,
        mode: WriteMode,
    ) -> Result<ProductRecord, ProductError> {
        let existing = self.get(id).await?;
        let replace = mode == WriteMode::Replace;

        let mut violations = Violations::new();
        let name = normalize_name(command.name, replace, &mut violations);
        if replace && command.price.is_none() {
            violations.push("price", REQUIRED);
        }
        match command.category_id {
            Some(category_id) => self.check_category(category_id, &mut violations).await?,
            None if replace => violations.push(CATEGORY_FIELD, REQUIRED),
            None => {}
        }
        violations.into_result().map_err(ProductError::Invalid)?;

        let description = match command.description {
            Some(value) => normalize_description(value),
            None => existing.description,
        };
        let category_id = command.category_id.unwrap_or(existing.category_id);

        let product = self
            .writer
            .update_product(UpdateProductParams {
                id,
                name: name.unwrap_or(existing.name),
                description,
                price: command.price.unwrap_or(existing.price),
                category_id,
            })
            .await
            .map_err(|err| map_write_error(err, category_id))?;

        info!(product_id = id, "Product updated");
        self.trigger.product_updated(id).await;
        Ok(product)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ProductError> {
        self.writer
            .delete_product(id)
            .await
            .map_err(|err| match err {
                RepoError::NotFound => ProductError::NotFound,
                other => ProductError::Repo(other),
            })?;

        info!(product_id = id, "Product deleted");
        self.trigger.product_deleted(id).await;
        Ok(())
    }

    async fn check_category(
        &self,
        category_id: i64,
        violations: &mut Violations,
    ) -> Result<(), ProductError> {
        if self.categories.find_category(category_id).await?.is_none() {
            violations.push(CATEGORY_FIELD, missing_category(category_id));
        }
        Ok(())
    }
}

fn missing_category(category_id: i64) -> String {
    format!("invalid pk \"{category_id}\": object does not exist")
}

/// The category check and the write are separate statements, so a concurrent category
/// delete surfaces here as a rejected foreign key.
fn map_write_error(err: RepoError, category_id: i64) -> ProductError {
    match err {
        RepoError::NotFound => ProductError::NotFound,
        RepoError::InvalidInput { .. } => ProductError::Invalid(Violations::single(
            CATEGORY_FIELD,
            missing_category(category_id),
        )),
        other => ProductError::Repo(other),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::application::repos::{CategoriesWriteRepo, CreateCategoryParams};
    use crate::cache::{CacheConfig, CacheTag};
    use crate::infra::memory::InMemoryRepositories;

    struct Fixture {
        service: ProductService,
        cache: Arc<ResponseCache>,
        category_id: i64,
    }

    async fn fixture() -> Fixture {
        let repos = Arc::new(InMemoryRepositories::new());
        let cache = Arc::new(ResponseCache::in_memory(CacheConfig::default()));
        let trigger = Arc::new(CacheTrigger::new(cache.clone()));
        let category = repos
            .create_category(CreateCategoryParams {
                name: "Test Category".into(),
                description: None,
            })
            .await
            .unwrap();
        let service = ProductService::new(
            repos.clone(),
            repos.clone(),
            repos,
            cache.clone(),
            trigger,
        );
        Fixture {
            service,
            cache,
            category_id: category.id,
        }
    }

    fn command(name: &str, cents: i64, category_id: i64) -> ProductCommand {
        ProductCommand {
            name: Some(name.to_string()),
            description: None,
            price: Some(Price::from_cents(cents).unwrap()),
            category_id: Some(category_id),
        }
    }

    fn names(payload: &ListPayload) -> Vec<String> {
        let items: Vec<Value> = serde_json::from_slice(&payload.body).unwrap();
        items
            .iter()
            .map(|item| item["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn list_applies_filters_and_ordering() {
        let fx = fixture().await;
        fx.service.create(command("Pen", 150, fx.category_id)).await.unwrap();
        fx.service.create(command("Book", 2_000, fx.category_id)).await.unwrap();
        fx.service.create(command("Atlas", 5_000, fx.category_id)).await.unwrap();

        let payload = fx
            .service
            .list(Some("price_gte=1.50&price_lte=20&ordering=-price"))
            .await
            .unwrap();
        assert_eq!(names(&payload), vec!["Book", "Pen"]);

        let payload = fx.service.list(Some("ordering=name")).await.unwrap();
        assert_eq!(names(&payload), vec!["Atlas", "Book", "Pen"]);
    }

    #[tokio::test]
    async fn equivalent_queries_hit_the_same_entry() {
        let fx = fixture().await;
        fx.service.create(command("Pen", 150, fx.category_id)).await.unwrap();

        let first = fx
            .service
            .list(Some("category_name=Test+Category&ordering=price"))
            .await
            .unwrap();
        assert_eq!(first.cache, CacheStatus::Miss);

        let second = fx
            .service
            .list(Some("ordering=price&utm=1&category__name=Test%20Category"))
            .await
            .unwrap();
        assert_eq!(second.cache, CacheStatus::Hit);
        assert_eq!(first.body, second.body);
    }

    #[tokio::test]
    async fn product_write_keeps_category_list_cached() {
        let fx = fixture().await;
        fx.cache
            .set(&CacheKey::category_list(), Bytes::from_static(b"[]"))
            .await;
        fx.service.list(None).await.unwrap();

        fx.service.create(command("Pen", 150, fx.category_id)).await.unwrap();

        assert_eq!(
            fx.cache.tracked_keys(CacheTag::CategoryList).await,
            vec!["store:categories".to_string()]
        );
        assert!(fx.cache.tracked_keys(CacheTag::ProductList).await.is_empty());
        assert_eq!(fx.service.list(None).await.unwrap().cache, CacheStatus::Miss);
    }

    #[tokio::test]
    async fn create_collects_every_violation() {
        let fx = fixture().await;
        let err = fx
            .service
            .create(ProductCommand {
                name: Some("  ".into()),
                description: None,
                price: None,
                category_id: Some(999),
            })
            .await
            .unwrap_err();
        let ProductError::Invalid(violations) = err else {
            panic!("expected validation error, got {err:?}");
        };
        let fields: Vec<&str> = violations.fields().iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["name", "price", "category_id"]);
        assert!(fx.cache.tracked_keys(CacheTag::ProductList).await.is_empty());
    }

    #[tokio::test]
    async fn invalid_filter_is_reported() {
        let fx = fixture().await;
        let err = fx.service.list(Some("price_gte=abc")).await.unwrap_err();
        assert!(matches!(err, ProductError::Filter(_)));
    }

    #[tokio::test]
    async fn partial_update_changes_only_given_fields() {
        let fx = fixture().await;
        let product = fx
            .service
            .create(command("Pen", 150, fx.category_id))
            .await
            .unwrap();

        let updated = fx
            .service
            .update(
                product.id,
                ProductCommand {
                    price: Some(Price::from_cents(175).unwrap()),
                    ..ProductCommand::default()
                },
                WriteMode::Partial,
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Pen");
        assert_eq!(updated.price.to_string(), "1.75");
        assert!(updated.updated_at >= product.updated_at);
    }

    #[tokio::test]
    async fn delete_missing_product_is_not_found() {
        let fx = fixture().await;
        assert!(matches!(
            fx.service.delete(7).await,
            Err(ProductError::NotFound)
        ));
    }
}
