//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Email and password accounts
//! - `cart` - Per-user cart quantities
//! - `products` - Product writes and their join rows
//! - `tags` - Product/tag reconciliation

pub mod auth;
pub mod cart;
pub mod products;
pub mod tags;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartManager, CartRemoval};
pub use products::{CreatedProduct, ProductError, ProductService, TagChanges};
pub use tags::{TagReconciliation, reconcile};
