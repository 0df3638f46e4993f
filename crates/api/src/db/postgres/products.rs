//! Product and product-tag queries.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use rust_decimal::Decimal;

use shopfloor_core::{CategoryId, ProductId, ProductTagId, TagId};

use super::{PgStore, map_write_error};
use crate::db::{ProductStore, RepositoryError};
use crate::models::{
    Category, NewProductTag, Product, ProductDetails, ProductFields, ProductTag, Tag,
};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Product joined with its (optional) category.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    product_name: String,
    price: Decimal,
    stock: i32,
    category_id: Option<CategoryId>,
    category_name: Option<String>,
}

impl ProductRow {
    fn into_parts(self) -> (Product, Option<Category>) {
        let category = self
            .category_id
            .zip(self.category_name)
            .map(|(id, name)| Category { id, name });
        let product = Product {
            id: self.id,
            name: self.product_name,
            price: self.price,
            stock: self.stock,
            category_id: self.category_id,
        };
        (product, category)
    }
}

/// Tag attached to a product.
#[derive(Debug, sqlx::FromRow)]
struct ProductTagNameRow {
    product_id: ProductId,
    tag_id: TagId,
    tag_name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductTagRow {
    id: ProductTagId,
    product_id: ProductId,
    tag_id: TagId,
}

impl From<ProductTagRow> for ProductTag {
    fn from(row: ProductTagRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            tag_id: row.tag_id,
        }
    }
}

/// Product columns as returned by `INSERT`/`UPDATE ... RETURNING`.
#[derive(Debug, sqlx::FromRow)]
struct PlainProductRow {
    id: ProductId,
    product_name: String,
    price: Decimal,
    stock: i32,
    category_id: Option<CategoryId>,
}

impl From<PlainProductRow> for Product {
    fn from(row: PlainProductRow) -> Self {
        Self {
            id: row.id,
            name: row.product_name,
            price: row.price,
            stock: row.stock,
            category_id: row.category_id,
        }
    }
}

const SELECT_PRODUCTS: &str = r"
    SELECT p.id, p.product_name, p.price, p.stock, p.category_id,
           c.category_name AS category_name
    FROM shop.product p
    LEFT JOIN shop.category c ON c.id = p.category_id
";

impl PgStore {
    /// Load tags for a set of products, keyed by product.
    async fn tags_for(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Vec<Tag>>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductTagNameRow>(
            r"
            SELECT pt.product_id, t.id AS tag_id, t.tag_name
            FROM shop.product_tag pt
            JOIN shop.tag t ON t.id = pt.tag_id
            WHERE pt.product_id = ANY($1)
            ORDER BY t.id
            ",
        )
        .bind(product_ids)
        .fetch_all(self.pool())
        .await?;

        let mut by_product: HashMap<ProductId, Vec<Tag>> = HashMap::new();
        for row in rows {
            by_product.entry(row.product_id).or_default().push(Tag {
                id: row.tag_id,
                name: row.tag_name,
            });
        }
        Ok(by_product)
    }

    async fn with_relations(
        &self,
        rows: Vec<ProductRow>,
    ) -> Result<Vec<ProductDetails>, RepositoryError> {
        let ids: Vec<ProductId> = rows.iter().map(|r| r.id).collect();
        let mut tags = self.tags_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let (product, category) = row.into_parts();
                let tags = tags.remove(&product.id).unwrap_or_default();
                ProductDetails {
                    product,
                    category,
                    tags,
                }
            })
            .collect())
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn list_products(&self) -> Result<Vec<ProductDetails>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCTS} ORDER BY p.id"))
            .fetch_all(self.pool())
            .await?;

        self.with_relations(rows).await
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<ProductDetails>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCTS} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(row) => Ok(self.with_relations(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create_product(
        &self,
        fields: &ProductFields,
        tags: &BTreeSet<TagId>,
    ) -> Result<(Product, Vec<ProductTag>), RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let row = sqlx::query_as::<_, PlainProductRow>(
            r"
            INSERT INTO shop.product (product_name, price, stock, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_name, price, stock, category_id
            ",
        )
        .bind(&fields.name)
        .bind(fields.price)
        .bind(fields.stock)
        .bind(fields.category_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;
        let product = Product::from(row);

        let rows: Vec<NewProductTag> = tags
            .iter()
            .map(|&tag_id| NewProductTag {
                product_id: product.id,
                tag_id,
            })
            .collect();
        let created = if rows.is_empty() {
            Vec::new()
        } else {
            insert_product_tags(&mut tx, &rows).await?
        };

        tx.commit().await?;

        Ok((product, created))
    }

    async fn update_product(
        &self,
        id: ProductId,
        fields: &ProductFields,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, PlainProductRow>(
            r"
            UPDATE shop.product
            SET product_name = $2, price = $3, stock = $4, category_id = $5
            WHERE id = $1
            RETURNING id, product_name, price, stock, category_id
            ",
        )
        .bind(id)
        .bind(&fields.name)
        .bind(fields.price)
        .bind(fields.stock)
        .bind(fields.category_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_write_error)?;

        Ok(row.map(Product::from))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("DELETE FROM shop.product_tag WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(deleted > 0)
    }

    async fn list_product_tags(&self, id: ProductId) -> Result<Vec<ProductTag>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductTagRow>(
            r"
            SELECT id, product_id, tag_id
            FROM shop.product_tag
            WHERE product_id = $1
            ORDER BY id
            ",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(ProductTag::from).collect())
    }

    async fn apply_tag_changes(
        &self,
        delete: &[ProductTagId],
        insert: &[NewProductTag],
    ) -> Result<(u64, Vec<ProductTag>), RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let removed = if delete.is_empty() {
            0
        } else {
            sqlx::query("DELETE FROM shop.product_tag WHERE id = ANY($1)")
                .bind(delete)
                .execute(&mut *tx)
                .await?
                .rows_affected()
        };

        let inserted = if insert.is_empty() {
            Vec::new()
        } else {
            insert_product_tags(&mut tx, insert).await?
        };

        tx.commit().await?;

        Ok((removed, inserted))
    }
}

/// Bulk insert join rows inside an open transaction.
async fn insert_product_tags(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    rows: &[NewProductTag],
) -> Result<Vec<ProductTag>, RepositoryError> {
    let product_ids: Vec<ProductId> = rows.iter().map(|r| r.product_id).collect();
    let tag_ids: Vec<TagId> = rows.iter().map(|r| r.tag_id).collect();

    let created = sqlx::query_as::<_, ProductTagRow>(
        r"
        INSERT INTO shop.product_tag (product_id, tag_id)
        SELECT * FROM UNNEST($1::int4[], $2::int4[])
        RETURNING id, product_id, tag_id
        ",
    )
    .bind(&product_ids)
    .bind(&tag_ids)
    .fetch_all(&mut **tx)
    .await
    .map_err(map_write_error)?;

    Ok(created.into_iter().map(ProductTag::from).collect())
}
