//! Persistence for the catalog, carts and user accounts.
//!
//! # Database: `shopfloor`
//!
//! ## Tables (schema `shop`)
//!
//! - `category` - Product categories
//! - `product` - Products, optionally filed under a category
//! - `tag` - Tags
//! - `product_tag` - Product/tag join rows, unique per pair
//! - `app_user` - Shopper accounts
//! - `cart` - Per-user, per-product quantities, unique per pair
//!
//! Sessions live in the `tower_sessions` schema managed by the session store.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p shopfloor-cli -- migrate
//! ```
//!
//! # Stores
//!
//! Handlers and services talk to the [`Store`] trait object held in
//! `AppState`. [`PgStore`] is the production implementation and
//! [`MemoryStore`] keeps everything in process for tests and local demos.

pub mod memory;
pub mod postgres;

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use shopfloor_core::{CartEntryId, CategoryId, Email, ProductId, ProductTagId, TagId, UserId};

use crate::models::{
    CartEntry, Category, CategoryDetails, NewProductTag, Product, ProductDetails, ProductFields,
    ProductTag, Tag, TagDetails, User, UserCredentials,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A referenced entity does not exist.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate product/tag pair).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Product and product-tag join operations.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All products with their category and tags.
    async fn list_products(&self) -> Result<Vec<ProductDetails>, RepositoryError>;

    /// One product with its category and tags.
    async fn get_product(&self, id: ProductId) -> Result<Option<ProductDetails>, RepositoryError>;

    /// Insert a product together with one join row per tag.
    ///
    /// Either everything is written or nothing is: an unknown category or tag
    /// leaves no product behind.
    async fn create_product(
        &self,
        fields: &ProductFields,
        tags: &BTreeSet<TagId>,
    ) -> Result<(Product, Vec<ProductTag>), RepositoryError>;

    /// Overwrite a product's columns. Returns `None` if the product does not exist.
    async fn update_product(
        &self,
        id: ProductId,
        fields: &ProductFields,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Remove a product's join rows and then the product itself.
    ///
    /// Returns `false` if the product did not exist.
    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError>;

    /// Current join rows for a product.
    async fn list_product_tags(&self, id: ProductId) -> Result<Vec<ProductTag>, RepositoryError>;

    /// Delete join rows by id and insert new ones as one step.
    ///
    /// Returns the number of rows removed and the inserted rows.
    async fn apply_tag_changes(
        &self,
        delete: &[ProductTagId],
        insert: &[NewProductTag],
    ) -> Result<(u64, Vec<ProductTag>), RepositoryError>;
}

/// Category operations.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<CategoryDetails>, RepositoryError>;

    async fn get_category(&self, id: CategoryId)
    -> Result<Option<CategoryDetails>, RepositoryError>;

    async fn create_category(&self, name: &str) -> Result<Category, RepositoryError>;

    /// Rename a category. Returns `None` if it does not exist.
    async fn update_category(
        &self,
        id: CategoryId,
        name: &str,
    ) -> Result<Option<Category>, RepositoryError>;

    /// Delete a category, detaching its products. Returns `false` if it did not exist.
    async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError>;
}

/// Tag operations.
#[async_trait]
pub trait TagStore: Send + Sync {
    async fn list_tags(&self) -> Result<Vec<TagDetails>, RepositoryError>;

    async fn get_tag(&self, id: TagId) -> Result<Option<TagDetails>, RepositoryError>;

    async fn create_tag(&self, name: &str) -> Result<Tag, RepositoryError>;

    /// Rename a tag. Returns `None` if it does not exist.
    async fn update_tag(&self, id: TagId, name: &str) -> Result<Option<Tag>, RepositoryError>;

    /// Delete a tag and its join rows. Returns `false` if it did not exist.
    async fn delete_tag(&self, id: TagId) -> Result<bool, RepositoryError>;
}

/// Cart entry operations.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn find_cart_entry(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartEntry>, RepositoryError>;

    /// Insert an entry. `RepositoryError::NotFound` if the product does not exist.
    async fn create_cart_entry(
        &self,
        user_id: UserId,
        product_id: ProductId,
        amount: i32,
    ) -> Result<CartEntry, RepositoryError>;

    async fn update_cart_amount(&self, id: CartEntryId, amount: i32) -> Result<(), RepositoryError>;

    async fn delete_cart_entry(&self, id: CartEntryId) -> Result<(), RepositoryError>;

    async fn list_cart(&self, user_id: UserId) -> Result<Vec<CartEntry>, RepositoryError>;
}

/// User account operations.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. `RepositoryError::Conflict` if the email is taken.
    async fn create_user(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, RepositoryError>;
}

/// Everything the API needs from persistence.
#[async_trait]
pub trait Store: ProductStore + CategoryStore + TagStore + CartStore + UserStore {
    /// Check that the backing store is reachable.
    async fn health_check(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
