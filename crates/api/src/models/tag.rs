//! Tag types.

use serde::{Deserialize, Serialize};

use shopfloor_core::TagId;

use super::{Product, ValidationError, required_name};

/// A tag that can be attached to any number of products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    #[serde(rename = "tag_name")]
    pub name: String,
}

/// A tag with the products carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDetails {
    #[serde(flatten)]
    pub tag: Tag,
    pub products: Vec<Product>,
}

/// Tag request body.
#[derive(Debug, Clone, Deserialize)]
pub struct TagInput {
    #[serde(alias = "name")]
    pub tag_name: String,
}

impl TagInput {
    /// Returns the trimmed tag name.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the name is blank.
    pub fn validate(&self) -> Result<String, ValidationError> {
        required_name("tag_name", &self.tag_name)
    }
}
