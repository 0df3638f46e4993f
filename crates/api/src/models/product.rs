//! Product and product-tag join types.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopfloor_core::{CategoryId, ProductId, ProductTagId, TagId};

use super::{Category, Tag, ValidationError, required_name};

/// Stock assigned when a create request leaves it out.
pub const DEFAULT_STOCK: i32 = 10;

/// A product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "product_name")]
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub category_id: Option<CategoryId>,
}

/// A product with its category and tags loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<Category>,
    pub tags: Vec<Tag>,
}

/// A join row linking one product to one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTag {
    pub id: ProductTagId,
    pub product_id: ProductId,
    pub tag_id: TagId,
}

/// A join row that has not been persisted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NewProductTag {
    pub product_id: ProductId,
    pub tag_id: TagId,
}

/// Product request body for create and update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[serde(alias = "product_name")]
    pub name: String,
    pub price: Decimal,
    #[serde(default = "default_stock")]
    pub stock: i32,
    #[serde(default, alias = "category_id")]
    pub category_id: Option<CategoryId>,
    /// Desired tag set. Absent on an update means "leave the tags alone".
    #[serde(default, alias = "tag_ids")]
    pub tag_ids: Option<Vec<TagId>>,
}

const fn default_stock() -> i32 {
    DEFAULT_STOCK
}

/// Validated product columns, ready for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub category_id: Option<CategoryId>,
}

impl ProductInput {
    /// Check field rules and split the body into columns and the desired tag set.
    ///
    /// Duplicate tag ids collapse, so a body listing a tag twice yields one join row.
    /// The tag set is `None` when the body has no `tagIds`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank name or a negative price or stock.
    pub fn validate(self) -> Result<(ProductFields, Option<BTreeSet<TagId>>), ValidationError> {
        let name = required_name("product_name", &self.name)?;
        if self.price < Decimal::ZERO {
            return Err(ValidationError("price cannot be negative".to_owned()));
        }
        if self.stock < 0 {
            return Err(ValidationError("stock cannot be negative".to_owned()));
        }

        let fields = ProductFields {
            name,
            price: self.price,
            stock: self.stock,
            category_id: self.category_id,
        };
        let tags = self.tag_ids.map(|ids| ids.into_iter().collect());
        Ok((fields, tags))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(json: &str) -> ProductInput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_input_accepts_camel_and_snake_case() {
        let camel = input(r#"{"name":"Widget","price":10,"categoryId":2,"tagIds":[1,2]}"#);
        let snake = input(
            r#"{"product_name":"Widget","price":"10","category_id":2,"tag_ids":[1,2]}"#,
        );

        assert_eq!(camel.name, snake.name);
        assert_eq!(camel.price, snake.price);
        assert_eq!(camel.category_id, Some(CategoryId::new(2)));
        assert_eq!(camel.tag_ids, snake.tag_ids);
    }

    #[test]
    fn test_input_defaults() {
        let body = input(r#"{"name":"Widget","price":10}"#);
        assert_eq!(body.stock, DEFAULT_STOCK);
        assert_eq!(body.category_id, None);
        assert!(body.tag_ids.is_none());
    }

    #[test]
    fn test_validate_dedupes_tags() {
        let (fields, tags) = input(r#"{"name":" Widget ","price":10,"tagIds":[2,1,2]}"#)
            .validate()
            .unwrap();
        assert_eq!(fields.name, "Widget");
        assert_eq!(
            tags.unwrap().into_iter().collect::<Vec<_>>(),
            vec![TagId::new(1), TagId::new(2)]
        );
    }

    #[test]
    fn test_validate_keeps_missing_and_empty_tags_apart() {
        let (_, missing) = input(r#"{"name":"Widget","price":10}"#).validate().unwrap();
        let (_, empty) = input(r#"{"name":"Widget","price":10,"tagIds":[]}"#).validate().unwrap();
        assert_eq!(missing, None);
        assert_eq!(empty, Some(BTreeSet::new()));
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        assert!(input(r#"{"name":"  ","price":10}"#).validate().is_err());
        assert!(input(r#"{"name":"Widget","price":-1}"#).validate().is_err());
        assert!(input(r#"{"name":"Widget","price":1,"stock":-3}"#).validate().is_err());
        assert!(input(r#"{"name":"Freebie","price":0}"#).validate().is_ok());
    }

    #[test]
    fn test_details_flatten_product_fields() {
        let details = ProductDetails {
            product: Product {
                id: ProductId::new(1),
                name: "Widget".to_owned(),
                price: Decimal::from(10),
                stock: 3,
                category_id: None,
            },
            category: None,
            tags: vec![],
        };
        let value = serde_json::to_value(&details).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["product_name"], "Widget");
        assert!(value["category"].is_null());
        assert_eq!(value["tags"], serde_json::json!([]));
    }
}
