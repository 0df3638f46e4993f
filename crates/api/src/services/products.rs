//! Product create, update and delete, including join-row maintenance.

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use shopfloor_core::ProductId;

use crate::db::{ProductStore, RepositoryError};
use crate::models::{Product, ProductDetails, ProductInput, ProductTag, ValidationError};
use crate::services::tags::reconcile;

/// Errors from product operations.
#[derive(Debug, Error)]
pub enum ProductError {
    /// The request body broke a field rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No product with the given id.
    #[error("product not found")]
    NotFound,

    /// The store refused a write made on the caller's behalf.
    ///
    /// Create and update report these as client errors.
    #[error("store rejected the write: {0}")]
    Rejected(RepositoryError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// What a create returns: the product itself, or its join rows when tags were given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CreatedProduct {
    Product(Product),
    Tags(Vec<ProductTag>),
}

/// Result of an update: rows removed and rows inserted by tag reconciliation.
///
/// Serializes as `[removed, [rows...]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagChanges(pub u64, pub Vec<ProductTag>);

/// Product operations over any [`ProductStore`].
pub struct ProductService<'a, S: ProductStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ProductStore + ?Sized> ProductService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// All products with category and tags.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Repository` if the store fails.
    pub async fn list(&self) -> Result<Vec<ProductDetails>, ProductError> {
        Ok(self.store.list_products().await?)
    }

    /// One product with category and tags, or `None`.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Repository` if the store fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<ProductDetails>, ProductError> {
        Ok(self.store.get_product(id).await?)
    }

    /// Create a product and, if tag ids were given, its join rows.
    ///
    /// The product and its join rows are written in one store call, so a
    /// rejected tag leaves no product behind.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Validation` for a bad body and
    /// `ProductError::Rejected` for any store failure.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: ProductInput) -> Result<CreatedProduct, ProductError> {
        let (fields, tags) = input.validate()?;
        let tags = tags.unwrap_or_default();

        let (product, rows) = self
            .store
            .create_product(&fields, &tags)
            .await
            .map_err(rejected)?;
        tracing::info!(product_id = %product.id, tags = rows.len(), "Product created");

        if tags.is_empty() {
            return Ok(CreatedProduct::Product(product));
        }
        Ok(CreatedProduct::Tags(rows))
    }

    /// Overwrite a product's columns and reconcile its tags to the given set.
    ///
    /// A body without `tagIds` updates the columns only and leaves every join
    /// row in place.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Validation` for a bad body,
    /// `ProductError::NotFound` for an unknown id and `ProductError::Rejected`
    /// for any store failure.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: ProductId,
        input: ProductInput,
    ) -> Result<TagChanges, ProductError> {
        let (fields, desired) = input.validate()?;

        self.store
            .update_product(id, &fields)
            .await
            .map_err(rejected)?
            .ok_or(ProductError::NotFound)?;

        let Some(desired) = desired else {
            tracing::debug!(product_id = %id, "No tag set given; tags left as they are");
            return Ok(TagChanges(0, Vec::new()));
        };

        let current = self.store.list_product_tags(id).await.map_err(rejected)?;
        let plan = reconcile(id, &current, &desired);
        if plan.is_empty() {
            tracing::debug!(product_id = %id, "Tags already up to date");
            return Ok(TagChanges(0, Vec::new()));
        }

        let (removed, inserted) = self
            .store
            .apply_tag_changes(&plan.to_delete, &plan.to_insert)
            .await
            .map_err(rejected)?;

        tracing::info!(
            product_id = %id,
            removed,
            inserted = inserted.len(),
            "Product tags reconciled"
        );
        Ok(TagChanges(removed, inserted))
    }

    /// Delete a product and its join rows.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` for an unknown id and
    /// `ProductError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<(), ProductError> {
        if !self.store.delete_product(id).await? {
            return Err(ProductError::NotFound);
        }
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }
}

fn rejected(err: RepositoryError) -> ProductError {
    tracing::warn!(error = %err, "Product write rejected");
    ProductError::Rejected(err)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopfloor_core::TagId;

    use super::*;
    use crate::db::{MemoryStore, TagStore};

    fn input(json: &str) -> ProductInput {
        serde_json::from_str(json).unwrap()
    }

    async fn store_with_tags(n: usize) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 0..n {
            store.create_tag(&format!("tag-{i}")).await.unwrap();
        }
        store
    }

    fn tag_ids(details: &ProductDetails) -> Vec<i32> {
        details.tags.iter().map(|t| t.id.as_i32()).collect()
    }

    #[tokio::test]
    async fn test_create_without_tags_returns_product_and_no_join_rows() {
        let store = store_with_tags(0).await;
        let service = ProductService::new(&store);

        let created = service
            .create(input(r#"{"name":"Widget","price":10}"#))
            .await
            .unwrap();

        let CreatedProduct::Product(product) = created else {
            panic!("expected a product");
        };
        assert_eq!(product.stock, 10);
        assert!(store.list_product_tags(product.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_then_update_swaps_only_changed_tags() {
        let store = store_with_tags(3).await;
        let service = ProductService::new(&store);

        let CreatedProduct::Tags(rows) = service
            .create(input(r#"{"name":"Widget","price":10,"tagIds":[1,2]}"#))
            .await
            .unwrap()
        else {
            panic!("expected join rows");
        };
        assert_eq!(rows.len(), 2);
        let id = rows[0].product_id;
        let row_for_two = rows.iter().find(|r| r.tag_id == TagId::new(2)).unwrap().id;

        let details = service.get(id).await.unwrap().unwrap();
        assert_eq!(details.product.name, "Widget");
        assert_eq!(tag_ids(&details), vec![1, 2]);

        let TagChanges(removed, inserted) = service
            .update(id, input(r#"{"name":"Widget","price":10,"tagIds":[2,3]}"#))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].tag_id, TagId::new(3));

        let current = store.list_product_tags(id).await.unwrap();
        assert_eq!(current.len(), 2);
        assert!(current.iter().any(|r| r.id == row_for_two));
        assert_eq!(tag_ids(&service.get(id).await.unwrap().unwrap()), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_repeated_update_is_a_no_op() {
        let store = store_with_tags(2).await;
        let service = ProductService::new(&store);
        let body = r#"{"name":"Widget","price":10,"tagIds":[1,2]}"#;
        let CreatedProduct::Tags(rows) = service.create(input(body)).await.unwrap() else {
            panic!("expected join rows");
        };
        let id = rows[0].product_id;

        let changes = service.update(id, input(body)).await.unwrap();
        assert_eq!(changes, TagChanges(0, Vec::new()));
    }

    #[tokio::test]
    async fn test_update_without_tag_ids_keeps_tags() {
        let store = store_with_tags(2).await;
        let service = ProductService::new(&store);
        let CreatedProduct::Tags(rows) = service
            .create(input(r#"{"name":"Widget","price":10,"tagIds":[1,2]}"#))
            .await
            .unwrap()
        else {
            panic!("expected join rows");
        };
        let id = rows[0].product_id;

        let changes = service
            .update(id, input(r#"{"name":"Widget2","price":11}"#))
            .await
            .unwrap();
        assert_eq!(changes, TagChanges(0, Vec::new()));

        let details = service.get(id).await.unwrap().unwrap();
        assert_eq!(details.product.name, "Widget2");
        assert_eq!(tag_ids(&details), vec![1, 2]);
        assert_eq!(store.list_product_tags(id).await.unwrap(), rows);
    }

    #[tokio::test]
    async fn test_update_with_empty_tag_ids_clears_tags() {
        let store = store_with_tags(1).await;
        let service = ProductService::new(&store);
        let CreatedProduct::Tags(rows) = service
            .create(input(r#"{"name":"Widget","price":10,"tagIds":[1]}"#))
            .await
            .unwrap()
        else {
            panic!("expected join rows");
        };
        let id = rows[0].product_id;

        let TagChanges(removed, inserted) = service
            .update(id, input(r#"{"name":"Widget","price":10,"tagIds":[]}"#))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(inserted.is_empty());
        assert!(store.list_product_tags(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_product_is_not_found() {
        let store = store_with_tags(0).await;
        let service = ProductService::new(&store);

        let err = service
            .update(ProductId::new(42), input(r#"{"name":"Widget","price":1}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::NotFound));
    }

    #[tokio::test]
    async fn test_unknown_tag_is_rejected() {
        let store = store_with_tags(1).await;
        let service = ProductService::new(&store);

        let err = service
            .create(input(r#"{"name":"Widget","price":1,"tagIds":[9]}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::Rejected(RepositoryError::NotFound)));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_checked() {
        let store = store_with_tags(1).await;
        let service = ProductService::new(&store);
        let CreatedProduct::Tags(rows) = service
            .create(input(r#"{"name":"Widget","price":1,"tagIds":[1]}"#))
            .await
            .unwrap()
        else {
            panic!("expected join rows");
        };
        let id = rows[0].product_id;

        service.delete(id).await.unwrap();
        assert!(service.get(id).await.unwrap().is_none());
        assert!(store.list_product_tags(id).await.unwrap().is_empty());
        assert!(matches!(service.delete(id).await, Err(ProductError::NotFound)));
    }

    #[test]
    fn test_tag_changes_serialize_as_pair() {
        let json = serde_json::to_value(TagChanges(1, Vec::new())).unwrap();
        assert_eq!(json, serde_json::json!([1, []]));
    }
}
