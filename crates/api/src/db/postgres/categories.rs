//! Category queries.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use shopfloor_core::{CategoryId, ProductId};

use super::{PgStore, map_write_error};
use crate::db::{CategoryStore, RepositoryError};
use crate::models::{Category, CategoryDetails, Product};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    category_name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.category_name,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryProductRow {
    id: ProductId,
    product_name: String,
    price: Decimal,
    stock: i32,
    category_id: CategoryId,
}

impl PgStore {
    async fn products_by_category(
        &self,
        ids: &[CategoryId],
    ) -> Result<HashMap<CategoryId, Vec<Product>>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryProductRow>(
            r"
            SELECT id, product_name, price, stock, category_id
            FROM shop.product
            WHERE category_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(ids)
        .fetch_all(self.pool())
        .await?;

        let mut grouped: HashMap<CategoryId, Vec<Product>> = HashMap::new();
        for row in rows {
            grouped.entry(row.category_id).or_default().push(Product {
                id: row.id,
                name: row.product_name,
                price: row.price,
                stock: row.stock,
                category_id: Some(row.category_id),
            });
        }
        Ok(grouped)
    }

    async fn category_details(
        &self,
        categories: Vec<Category>,
    ) -> Result<Vec<CategoryDetails>, RepositoryError> {
        let ids: Vec<CategoryId> = categories.iter().map(|c| c.id).collect();
        let mut products = self.products_by_category(&ids).await?;

        Ok(categories
            .into_iter()
            .map(|category| CategoryDetails {
                products: products.remove(&category.id).unwrap_or_default(),
                category,
            })
            .collect())
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn list_categories(&self) -> Result<Vec<CategoryDetails>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, category_name FROM shop.category ORDER BY id",
        )
        .fetch_all(self.pool())
        .await?;

        self.category_details(rows.into_iter().map(Category::from).collect())
            .await
    }

    async fn get_category(
        &self,
        id: CategoryId,
    ) -> Result<Option<CategoryDetails>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, category_name FROM shop.category WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => Ok(self.category_details(vec![row.into()]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create_category(&self, name: &str) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "INSERT INTO shop.category (category_name) VALUES ($1) RETURNING id, category_name",
        )
        .bind(name)
        .fetch_one(self.pool())
        .await
        .map_err(map_write_error)?;

        Ok(row.into())
    }

    async fn update_category(
        &self,
        id: CategoryId,
        name: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE shop.category SET category_name = $2
            WHERE id = $1
            RETURNING id, category_name
            ",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(self.pool())
        .await
        .map_err(map_write_error)?;

        Ok(row.map(Category::from))
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        // product.category_id is ON DELETE SET NULL
        let deleted = sqlx::query("DELETE FROM shop.category WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }
}
