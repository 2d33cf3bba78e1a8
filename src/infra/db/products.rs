use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::{
    application::repos::{
        CreateProductParams, ProductOrdering, ProductQueryFilter, ProductSortField,
        ProductsRepo, ProductsWriteRepo, RepoError, UpdateProductParams,
    },
    domain::{entities::ProductRecord, price::Price},
};

use super::{
    PostgresRepositories,
    util::{convert_count, map_sqlx_error},
};

const PRODUCT_COLUMNS: &str =
    "p.id, p.name, p.description, p.price_cents, p.category_id, p.created_at, p.updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: Option<String>,
    price_cents: i64,
    category_id: i64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<ProductRow> for ProductRecord {
    type Error = RepoError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::from_cents(row.price_cents).map_err(|err| {
            RepoError::from_persistence(format!("product {} has invalid price: {err}", row.id))
        })?;
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price,
            category_id: row.category_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_records(rows: Vec<ProductRow>) -> Result<Vec<ProductRecord>, RepoError> {
    rows.into_iter().map(ProductRecord::try_from).collect()
}

impl PostgresRepositories {
    fn apply_product_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &'q ProductQueryFilter) {
        if let Some(name) = filter.category_name.as_ref() {
            qb.push(" AND c.name = ");
            qb.push_bind(name);
        }
        if let Some(min) = filter.price_gte {
            qb.push(" AND p.price_cents >= ");
            qb.push_bind(min.cents());
        }
        if let Some(max) = filter.price_lte {
            qb.push(" AND p.price_cents <= ");
            qb.push_bind(max.cents());
        }
    }

    fn push_product_ordering(qb: &mut QueryBuilder<'_, Postgres>, ordering: Option<ProductOrdering>) {
        qb.push(" ORDER BY ");
        if let Some(ordering) = ordering {
            qb.push(match ordering.field {
                ProductSortField::Price => "p.price_cents",
                ProductSortField::Name => "p.name COLLATE \"C\"",
            });
            qb.push(if ordering.descending { " DESC, " } else { " ASC, " });
        }
        qb.push("p.id ASC");
    }
}

#[async_trait]
impl ProductsRepo for PostgresRepositories {
    async fn list_products(
        &self,
        filter: &ProductQueryFilter,
    ) -> Result<Vec<ProductRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(PRODUCT_COLUMNS);
        qb.push(" FROM products p INNER JOIN categories c ON c.id = p.category_id WHERE 1 = 1");
        Self::apply_product_filter(&mut qb, filter);
        Self::push_product_ordering(&mut qb, filter.ordering);

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        into_records(rows)
    }

    async fn find_product(&self, id: i64) -> Result<Option<ProductRecord>, RepoError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(ProductRecord::try_from).transpose()
    }

    async fn count_by_category(&self, category_id: i64) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(category_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }
}

#[async_trait]
impl ProductsWriteRepo for PostgresRepositories {
    async fn create_product(
        &self,
        params: CreateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products AS p (name, description, price_cents, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING p.id, p.name, p.description, p.price_cents, p.category_id,
                      p.created_at, p.updated_at
            "#,
        )
        .bind(params.name)
        .bind(params.description)
        .bind(params.price.cents())
        .bind(params.category_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.try_into()
    }

    async fn update_product(
        &self,
        params: UpdateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products AS p
            SET name = $2,
                description = $3,
                price_cents = $4,
                category_id = $5,
                updated_at = now()
            WHERE p.id = $1
            RETURNING p.id, p.name, p.description, p.price_cents, p.category_id,
                      p.created_at, p.updated_at
            "#,
        )
        .bind(params.id)
        .bind(params.name)
        .bind(params.description)
        .bind(params.price.cents())
        .bind(params.category_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(ProductRecord::try_from)
            .transpose()?
            .ok_or(RepoError::NotFound)
    }

    async fn delete_product(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
