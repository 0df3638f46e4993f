//! Seed the catalog from a YAML file.
//!
//! Categories and tags are matched by name, so re-running a seed reuses the
//! rows it created before. Products whose name already exists are skipped.
//!
//! ```yaml
//! categories: [Shirts, Shorts]
//! tags: [rock music, pop music]
//! products:
//!   - name: Plain T-Shirt
//!     price: "14.99"
//!     stock: 14
//!     category: Shirts
//!     tags: [rock music]
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use shopfloor_api::db::{PgStore, RepositoryError, Store};
use shopfloor_api::models::ProductInput;
use shopfloor_api::models::product::DEFAULT_STOCK;
use shopfloor_api::services::{ProductError, ProductService};
use shopfloor_core::{CategoryId, TagId};

/// Errors from loading or applying a seed file.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("product '{product}' names unknown category '{category}'")]
    UnknownCategory { product: String, category: String },

    #[error("product '{product}' names unknown tag '{tag}'")]
    UnknownTag { product: String, tag: String },

    #[error("product '{product}': {source}")]
    Product {
        product: String,
        #[source]
        source: ProductError,
    },

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Catalog file contents.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

/// One product entry, referring to categories and tags by name.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedProduct {
    pub name: String,
    pub price: Decimal,
    #[serde(default = "default_stock")]
    pub stock: i32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

const fn default_stock() -> i32 {
    DEFAULT_STOCK
}

/// Counts reported after seeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories_created: usize,
    pub tags_created: usize,
    pub products_created: usize,
    pub products_skipped: usize,
}

/// Seed the database from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the database cannot
/// be reached, or a product cannot be written.
pub async fn run(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    // Verify file exists
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Parse YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: Catalog = serde_yaml::from_str(&content)?;
    info!(
        categories = catalog.categories.len(),
        tags = catalog.tags.len(),
        products = catalog.products.len(),
        "Parsed catalog"
    );

    let store = PgStore::new(super::connect().await?);
    let summary = seed_catalog(&store, &catalog).await?;

    info!("Seeding complete!");
    info!("  Categories created: {}", summary.categories_created);
    info!("  Tags created: {}", summary.tags_created);
    info!("  Products created: {}", summary.products_created);
    info!("  Products skipped (already exist): {}", summary.products_skipped);

    Ok(())
}

/// Apply a parsed catalog to any store.
///
/// # Errors
///
/// Returns `SeedError` for unknown category/tag references or a failed write.
/// Writes made before the failure are kept.
pub async fn seed_catalog<S: Store + ?Sized>(
    store: &S,
    catalog: &Catalog,
) -> Result<SeedSummary, SeedError> {
    let mut summary = SeedSummary::default();

    let mut categories: HashMap<String, CategoryId> = store
        .list_categories()
        .await?
        .into_iter()
        .map(|c| (c.category.name, c.category.id))
        .collect();
    for name in &catalog.categories {
        if !categories.contains_key(name) {
            let category = store.create_category(name).await?;
            categories.insert(category.name, category.id);
            summary.categories_created += 1;
        }
    }

    let mut tags: HashMap<String, TagId> = store
        .list_tags()
        .await?
        .into_iter()
        .map(|t| (t.tag.name, t.tag.id))
        .collect();
    for name in &catalog.tags {
        if !tags.contains_key(name) {
            let tag = store.create_tag(name).await?;
            tags.insert(tag.name, tag.id);
            summary.tags_created += 1;
        }
    }

    let existing: HashSet<String> = store
        .list_products()
        .await?
        .into_iter()
        .map(|p| p.product.name)
        .collect();
    let products = ProductService::new(store);

    for entry in &catalog.products {
        if existing.contains(&entry.name) {
            summary.products_skipped += 1;
            continue;
        }

        let category_id = entry
            .category
            .as_ref()
            .map(|name| {
                categories
                    .get(name)
                    .copied()
                    .ok_or_else(|| SeedError::UnknownCategory {
                        product: entry.name.clone(),
                        category: name.clone(),
                    })
            })
            .transpose()?;

        let tag_ids = entry
            .tags
            .iter()
            .map(|name| {
                tags.get(name).copied().ok_or_else(|| SeedError::UnknownTag {
                    product: entry.name.clone(),
                    tag: name.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let input = ProductInput {
            name: entry.name.clone(),
            price: entry.price,
            stock: entry.stock,
            category_id,
            tag_ids: Some(tag_ids),
        };
        products
            .create(input)
            .await
            .map_err(|source| SeedError::Product {
                product: entry.name.clone(),
                source,
            })?;
        summary.products_created += 1;
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopfloor_api::db::{MemoryStore, ProductStore};

    use super::*;

    const CATALOG: &str = r#"
categories: [Shirts, Shorts]
tags: [rock music, pop music]
products:
  - name: Plain T-Shirt
    price: "14.99"
    stock: 14
    category: Shirts
    tags: [rock music, pop music]
  - name: Cargo Shorts
    price: "29.99"
    category: Shorts
"#;

    #[tokio::test]
    async fn test_seed_creates_catalog_with_tags() {
        let store = MemoryStore::new();
        let catalog: Catalog = serde_yaml::from_str(CATALOG).unwrap();

        let summary = seed_catalog(&store, &catalog).await.unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                categories_created: 2,
                tags_created: 2,
                products_created: 2,
                products_skipped: 0,
            }
        );

        let products = store.list_products().await.unwrap();
        let shirt = products
            .iter()
            .find(|p| p.product.name == "Plain T-Shirt")
            .unwrap();
        assert_eq!(shirt.tags.len(), 2);
        assert_eq!(shirt.category.as_ref().unwrap().name, "Shirts");

        let shorts = products
            .iter()
            .find(|p| p.product.name == "Cargo Shorts")
            .unwrap();
        assert_eq!(shorts.product.stock, DEFAULT_STOCK);
        assert!(shorts.tags.is_empty());
    }

    #[tokio::test]
    async fn test_reseed_reuses_rows() {
        let store = MemoryStore::new();
        let catalog: Catalog = serde_yaml::from_str(CATALOG).unwrap();
        seed_catalog(&store, &catalog).await.unwrap();

        let again = seed_catalog(&store, &catalog).await.unwrap();
        assert_eq!(again.categories_created, 0);
        assert_eq!(again.tags_created, 0);
        assert_eq!(again.products_skipped, 2);
        assert_eq!(store.list_products().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_tag_is_reported() {
        let store = MemoryStore::new();
        let catalog: Catalog = serde_yaml::from_str(
            "products:\n  - name: Hat\n    price: \"5\"\n    tags: [missing]\n",
        )
        .unwrap();

        let err = seed_catalog(&store, &catalog).await.unwrap_err();
        assert!(matches!(err, SeedError::UnknownTag { tag, .. } if tag == "missing"));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(serde_yaml::from_str::<Catalog>("colours: [red]\n").is_err());
    }
}
