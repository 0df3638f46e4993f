//! Tag queries.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use shopfloor_core::{CategoryId, ProductId, TagId};

use super::{PgStore, map_write_error};
use crate::db::{RepositoryError, TagStore};
use crate::models::{Product, Tag, TagDetails};

#[derive(Debug, sqlx::FromRow)]
struct TagRow {
    id: TagId,
    tag_name: String,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            name: row.tag_name,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TaggedProductRow {
    tag_id: TagId,
    id: ProductId,
    product_name: String,
    price: Decimal,
    stock: i32,
    category_id: Option<CategoryId>,
}

impl PgStore {
    async fn products_by_tag(
        &self,
        ids: &[TagId],
    ) -> Result<HashMap<TagId, Vec<Product>>, RepositoryError> {
        let rows = sqlx::query_as::<_, TaggedProductRow>(
            r"
            SELECT pt.tag_id, p.id, p.product_name, p.price, p.stock, p.category_id
            FROM shop.product_tag pt
            JOIN shop.product p ON p.id = pt.product_id
            WHERE pt.tag_id = ANY($1)
            ORDER BY p.id
            ",
        )
        .bind(ids)
        .fetch_all(self.pool())
        .await?;

        let mut grouped: HashMap<TagId, Vec<Product>> = HashMap::new();
        for row in rows {
            grouped.entry(row.tag_id).or_default().push(Product {
                id: row.id,
                name: row.product_name,
                price: row.price,
                stock: row.stock,
                category_id: row.category_id,
            });
        }
        Ok(grouped)
    }

    async fn tag_details(&self, tags: Vec<Tag>) -> Result<Vec<TagDetails>, RepositoryError> {
        let ids: Vec<TagId> = tags.iter().map(|t| t.id).collect();
        let mut products = self.products_by_tag(&ids).await?;

        Ok(tags
            .into_iter()
            .map(|tag| TagDetails {
                products: products.remove(&tag.id).unwrap_or_default(),
                tag,
            })
            .collect())
    }
}

#[async_trait]
impl TagStore for PgStore {
    async fn list_tags(&self) -> Result<Vec<TagDetails>, RepositoryError> {
        let rows = sqlx::query_as::<_, TagRow>("SELECT id, tag_name FROM shop.tag ORDER BY id")
            .fetch_all(self.pool())
            .await?;

        self.tag_details(rows.into_iter().map(Tag::from).collect())
            .await
    }

    async fn get_tag(&self, id: TagId) -> Result<Option<TagDetails>, RepositoryError> {
        let row = sqlx::query_as::<_, TagRow>("SELECT id, tag_name FROM shop.tag WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(row) => Ok(self.tag_details(vec![row.into()]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create_tag(&self, name: &str) -> Result<Tag, RepositoryError> {
        let row = sqlx::query_as::<_, TagRow>(
            "INSERT INTO shop.tag (tag_name) VALUES ($1) RETURNING id, tag_name",
        )
        .bind(name)
        .fetch_one(self.pool())
        .await
        .map_err(map_write_error)?;

        Ok(row.into())
    }

    async fn update_tag(&self, id: TagId, name: &str) -> Result<Option<Tag>, RepositoryError> {
        let row = sqlx::query_as::<_, TagRow>(
            "UPDATE shop.tag SET tag_name = $2 WHERE id = $1 RETURNING id, tag_name",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(self.pool())
        .await
        .map_err(map_write_error)?;

        Ok(row.map(Tag::from))
    }

    async fn delete_tag(&self, id: TagId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("DELETE FROM shop.product_tag WHERE tag_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM shop.tag WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(deleted > 0)
    }
}
