//! Domain models for the catalog, the cart and user accounts.
//!
//! Row types used by the `PostgreSQL` store live in `db::postgres`; these are
//! the validated types handlers and services exchange.

pub mod cart;
pub mod category;
pub mod product;
pub mod session;
pub mod tag;
pub mod user;

use thiserror::Error;

pub use cart::CartEntry;
pub use category::{Category, CategoryDetails, CategoryInput};
pub use product::{NewProductTag, Product, ProductDetails, ProductFields, ProductInput, ProductTag};
pub use session::{RequestContext, keys as session_keys};
pub use tag::{Tag, TagDetails, TagInput};
pub use user::{User, UserCredentials};

/// A request body decoded fine but breaks a field rule.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Trim a name field, rejecting blank values.
pub(crate) fn required_name(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError(format!("{field} cannot be blank")));
    }
    Ok(trimmed.to_owned())
}
