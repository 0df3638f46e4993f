//! Cart quantity management.
//!
//! Each `(user, product)` pair has at most one cart row. Adding creates the
//! row at amount 1 or bumps it by one; removing lowers it by one and deletes
//! the row once it would reach zero.
//!
//! The read-then-write below is not atomic. Two concurrent adds for an existing
//! row can both read `N` and both write `N + 1`. Two concurrent *first* adds are
//! safe: the `PostgreSQL` store folds a conflicting insert into the existing row.

use thiserror::Error;
use tracing::instrument;

use shopfloor_core::{ProductId, UserId};

use crate::db::{CartStore, RepositoryError};
use crate::models::{CartEntry, RequestContext};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// No logged-in user on the request.
    #[error("must authenticate")]
    NotAuthenticated,

    /// Remove was called for a product that is not in the cart.
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Result of a successful remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartRemoval {
    /// The row still exists with the lowered amount.
    Decremented(CartEntry),
    /// The amount reached zero and the row was deleted.
    Deleted,
}

/// Cart operations for the user on the current request.
pub struct CartManager<'a, S: CartStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: CartStore + ?Sized> CartManager<'a, S> {
    /// Create a cart manager over a store.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Add one unit of a product to the caller's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotAuthenticated` without touching the store when
    /// the request has no logged-in user, and `CartError::Repository` if the
    /// store fails (`RepositoryError::NotFound` for an unknown product).
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        ctx: &RequestContext,
        product_id: ProductId,
    ) -> Result<CartEntry, CartError> {
        let user_id = require_user(ctx)?;

        let entry = match self.store.find_cart_entry(user_id, product_id).await? {
            None => self.store.create_cart_entry(user_id, product_id, 1).await?,
            Some(mut entry) => {
                entry.amount = entry
                    .amount
                    .checked_add(1)
                    .ok_or_else(|| amount_at_limit(product_id))?;
                self.store.update_cart_amount(entry.id, entry.amount).await?;
                entry
            }
        };

        tracing::debug!(%user_id, %product_id, amount = entry.amount, "Added to cart");
        Ok(entry)
    }

    /// Remove one unit of a product from the caller's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotAuthenticated` when the request has no logged-in
    /// user, `CartError::NotInCart` when there is no row for the pair, and
    /// `CartError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        ctx: &RequestContext,
        product_id: ProductId,
    ) -> Result<CartRemoval, CartError> {
        let user_id = require_user(ctx)?;

        let Some(mut entry) = self.store.find_cart_entry(user_id, product_id).await? else {
            return Err(CartError::NotInCart(product_id));
        };

        entry.amount -= 1;
        if entry.amount <= 0 {
            self.store.delete_cart_entry(entry.id).await?;
            tracing::debug!(%user_id, %product_id, "Removed last unit from cart");
            return Ok(CartRemoval::Deleted);
        }

        self.store.update_cart_amount(entry.id, entry.amount).await?;
        tracing::debug!(%user_id, %product_id, amount = entry.amount, "Removed from cart");
        Ok(CartRemoval::Decremented(entry))
    }

    /// All rows in the caller's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotAuthenticated` or `CartError::Repository`.
    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<CartEntry>, CartError> {
        let user_id = require_user(ctx)?;
        Ok(self.store.list_cart(user_id).await?)
    }
}

fn require_user(ctx: &RequestContext) -> Result<UserId, CartError> {
    ctx.user_id.ok_or(CartError::NotAuthenticated)
}

fn amount_at_limit(product_id: ProductId) -> RepositoryError {
    RepositoryError::Conflict(format!("cart amount for product {product_id} is at its limit"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use rust_decimal::Decimal;
    use shopfloor_core::Email;

    use super::*;
    use crate::db::{MemoryStore, ProductStore, UserStore};
    use crate::models::ProductFields;

    async fn setup() -> (MemoryStore, RequestContext, ProductId) {
        let store = MemoryStore::new();
        let user = store
            .create_user(&Email::parse("shopper@example.com").unwrap(), "hash")
            .await
            .unwrap();
        let fields = ProductFields {
            name: "Widget".to_owned(),
            price: Decimal::from(10),
            stock: 5,
            category_id: None,
        };
        let (product, _) = store.create_product(&fields, &BTreeSet::new()).await.unwrap();
        (store, RequestContext::authenticated(user.id), product.id)
    }

    #[tokio::test]
    async fn test_add_twice_yields_one_row_with_amount_two() {
        let (store, ctx, product) = setup().await;
        let cart = CartManager::new(&store);

        let first = cart.add(&ctx, product).await.unwrap();
        let second = cart.add(&ctx, product).await.unwrap();

        assert_eq!(first.amount, 1);
        assert_eq!(second.amount, 2);
        assert_eq!(first.id, second.id);

        let rows = cart.list(&ctx).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, 2);
    }

    #[tokio::test]
    async fn test_remove_last_unit_deletes_row() {
        let (store, ctx, product) = setup().await;
        let cart = CartManager::new(&store);
        cart.add(&ctx, product).await.unwrap();

        let removal = cart.remove(&ctx, product).await.unwrap();

        assert_eq!(removal, CartRemoval::Deleted);
        let user = ctx.user_id.unwrap();
        assert!(store.find_cart_entry(user, product).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_decrements_above_one() {
        let (store, ctx, product) = setup().await;
        let cart = CartManager::new(&store);
        cart.add(&ctx, product).await.unwrap();
        cart.add(&ctx, product).await.unwrap();
        cart.add(&ctx, product).await.unwrap();

        let removal = cart.remove(&ctx, product).await.unwrap();

        assert!(matches!(removal, CartRemoval::Decremented(e) if e.amount == 2));
        let user = ctx.user_id.unwrap();
        let stored = store.find_cart_entry(user, product).await.unwrap().unwrap();
        assert_eq!(stored.amount, 2);
    }

    #[tokio::test]
    async fn test_remove_missing_entry_is_not_in_cart() {
        let (store, ctx, product) = setup().await;
        let cart = CartManager::new(&store);

        let err = cart.remove(&ctx, product).await.unwrap_err();
        assert!(matches!(err, CartError::NotInCart(p) if p == product));
    }

    #[tokio::test]
    async fn test_anonymous_requests_leave_cart_untouched() {
        let (store, ctx, product) = setup().await;
        let cart = CartManager::new(&store);
        let anonymous = RequestContext::anonymous();

        assert!(matches!(
            cart.add(&anonymous, product).await,
            Err(CartError::NotAuthenticated)
        ));
        assert!(matches!(
            cart.remove(&anonymous, product).await,
            Err(CartError::NotAuthenticated)
        ));
        assert!(cart.list(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_not_found() {
        let (store, ctx, _) = setup().await;
        let cart = CartManager::new(&store);

        let err = cart.add(&ctx, ProductId::new(999)).await.unwrap_err();
        assert!(matches!(err, CartError::Repository(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_add_at_amount_limit_is_conflict() {
        let (store, ctx, product) = setup().await;
        let user = ctx.user_id.unwrap();
        store.create_cart_entry(user, product, i32::MAX).await.unwrap();
        let cart = CartManager::new(&store);

        let err = cart.add(&ctx, product).await.unwrap_err();
        assert!(matches!(err, CartError::Repository(RepositoryError::Conflict(_))));

        let stored = store.find_cart_entry(user, product).await.unwrap().unwrap();
        assert_eq!(stored.amount, i32::MAX);
        assert!(matches!(
            store.create_cart_entry(user, product, 1).await,
            Err(RepositoryError::Conflict(_))
        ));
    }
}
