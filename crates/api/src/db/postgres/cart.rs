//! Cart queries.

use async_trait::async_trait;

use shopfloor_core::{CartEntryId, ProductId, UserId};

use super::{PgStore, map_write_error};
use crate::db::{CartStore, RepositoryError};
use crate::models::CartEntry;

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: CartEntryId,
    user_id: UserId,
    product_id: ProductId,
    amount: i32,
}

impl From<CartRow> for CartEntry {
    fn from(row: CartRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            amount: row.amount,
        }
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn find_cart_entry(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartEntry>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, product_id, amount
            FROM shop.cart
            WHERE user_id = $1 AND product_id = $2
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(CartEntry::from))
    }

    async fn create_cart_entry(
        &self,
        user_id: UserId,
        product_id: ProductId,
        amount: i32,
    ) -> Result<CartEntry, RepositoryError> {
        // A racing first add for the same pair folds into the existing row
        // instead of tripping the unique constraint.
        let row = sqlx::query_as::<_, CartRow>(
            r"
            INSERT INTO shop.cart (user_id, product_id, amount)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET amount = shop.cart.amount + EXCLUDED.amount
            RETURNING id, user_id, product_id, amount
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(amount)
        .fetch_one(self.pool())
        .await
        .map_err(map_write_error)?;

        Ok(row.into())
    }

    async fn update_cart_amount(
        &self,
        id: CartEntryId,
        amount: i32,
    ) -> Result<(), RepositoryError> {
        let updated = sqlx::query("UPDATE shop.cart SET amount = $2 WHERE id = $1")
            .bind(id)
            .bind(amount)
            .execute(self.pool())
            .await
            .map_err(map_write_error)?
            .rows_affected();

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_cart_entry(&self, id: CartEntryId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM shop.cart WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn list_cart(&self, user_id: UserId) -> Result<Vec<CartEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, product_id, amount
            FROM shop.cart
            WHERE user_id = $1
            ORDER BY id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(CartEntry::from).collect())
    }
}
