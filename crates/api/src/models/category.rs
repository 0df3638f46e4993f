//! Category types.

use serde::{Deserialize, Serialize};

use shopfloor_core::CategoryId;

use super::{Product, ValidationError, required_name};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(rename = "category_name")]
    pub name: String,
}

/// A category with the products filed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDetails {
    #[serde(flatten)]
    pub category: Category,
    pub products: Vec<Product>,
}

/// Category request body.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    #[serde(alias = "name")]
    pub category_name: String,
}

impl CategoryInput {
    /// Returns the trimmed category name.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the name is blank.
    pub fn validate(&self) -> Result<String, ValidationError> {
        required_name("category_name", &self.category_name)
    }
}
