//! In-process store.
//!
//! Mirrors the `PostgreSQL` constraints that matter to callers: foreign keys
//! surface as `RepositoryError::NotFound` and the unique product/tag and
//! user/product pairs surface as `RepositoryError::Conflict`.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use shopfloor_core::{CartEntryId, CategoryId, Email, ProductId, ProductTagId, TagId, UserId};

use super::{CartStore, CategoryStore, ProductStore, RepositoryError, Store, TagStore, UserStore};
use crate::models::{
    CartEntry, Category, CategoryDetails, NewProductTag, Product, ProductDetails, ProductFields,
    ProductTag, Tag, TagDetails, User, UserCredentials,
};

/// Store that keeps every table in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    tags: BTreeMap<TagId, Tag>,
    product_tags: BTreeMap<ProductTagId, ProductTag>,
    carts: BTreeMap<CartEntryId, CartEntry>,
    users: BTreeMap<UserId, UserCredentials>,
    sequences: Sequences,
}

/// Per-table serial counters, so ids start at 1 like `SERIAL` columns.
#[derive(Default)]
struct Sequences {
    category: i32,
    product: i32,
    tag: i32,
    product_tag: i32,
    cart: i32,
    user: i32,
}

fn next(seq: &mut i32) -> i32 {
    *seq += 1;
    *seq
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    fn details(&self, product: &Product) -> ProductDetails {
        let category = product
            .category_id
            .and_then(|id| self.categories.get(&id))
            .cloned();

        let mut tags: Vec<Tag> = self
            .product_tags
            .values()
            .filter(|pt| pt.product_id == product.id)
            .filter_map(|pt| self.tags.get(&pt.tag_id))
            .cloned()
            .collect();
        tags.sort_by_key(|t| t.id);

        ProductDetails {
            product: product.clone(),
            category,
            tags,
        }
    }

    fn check_category(&self, id: Option<CategoryId>) -> Result<(), RepositoryError> {
        match id {
            Some(id) if !self.categories.contains_key(&id) => Err(RepositoryError::NotFound),
            _ => Ok(()),
        }
    }

    fn check_new_tags(&self, rows: &[NewProductTag]) -> Result<(), RepositoryError> {
        for (i, row) in rows.iter().enumerate() {
            if !self.products.contains_key(&row.product_id) || !self.tags.contains_key(&row.tag_id)
            {
                return Err(RepositoryError::NotFound);
            }
            let duplicate_in_batch = rows.iter().take(i).any(|earlier| earlier == row);
            let duplicate_stored = self
                .product_tags
                .values()
                .any(|pt| pt.product_id == row.product_id && pt.tag_id == row.tag_id);
            if duplicate_in_batch || duplicate_stored {
                return Err(RepositoryError::Conflict(format!(
                    "product {} already has tag {}",
                    row.product_id, row.tag_id
                )));
            }
        }
        Ok(())
    }

    fn insert_tags(&mut self, rows: &[NewProductTag]) -> Vec<ProductTag> {
        rows.iter()
            .map(|row| {
                let pt = ProductTag {
                    id: ProductTagId::new(next(&mut self.sequences.product_tag)),
                    product_id: row.product_id,
                    tag_id: row.tag_id,
                };
                self.product_tags.insert(pt.id, pt);
                pt
            })
            .collect()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list_products(&self) -> Result<Vec<ProductDetails>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.products.values().map(|p| tables.details(p)).collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<ProductDetails>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.products.get(&id).map(|p| tables.details(p)))
    }

    async fn create_product(
        &self,
        fields: &ProductFields,
        tags: &BTreeSet<TagId>,
    ) -> Result<(Product, Vec<ProductTag>), RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.check_category(fields.category_id)?;
        // checked up front so a bad tag id writes nothing
        if tags.iter().any(|id| !tables.tags.contains_key(id)) {
            return Err(RepositoryError::NotFound);
        }

        let product = Product {
            id: ProductId::new(next(&mut tables.sequences.product)),
            name: fields.name.clone(),
            price: fields.price,
            stock: fields.stock,
            category_id: fields.category_id,
        };
        tables.products.insert(product.id, product.clone());

        let rows: Vec<NewProductTag> = tags
            .iter()
            .map(|&tag_id| NewProductTag {
                product_id: product.id,
                tag_id,
            })
            .collect();
        let created = tables.insert_tags(&rows);
        Ok((product, created))
    }

    async fn update_product(
        &self,
        id: ProductId,
        fields: &ProductFields,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.check_category(fields.category_id)?;

        let Some(product) = tables.products.get_mut(&id) else {
            return Ok(None);
        };
        product.name.clone_from(&fields.name);
        product.price = fields.price;
        product.stock = fields.stock;
        product.category_id = fields.category_id;
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.product_tags.retain(|_, pt| pt.product_id != id);
        // cart rows cascade with the product
        tables.carts.retain(|_, entry| entry.product_id != id);
        Ok(tables.products.remove(&id).is_some())
    }

    async fn list_product_tags(&self, id: ProductId) -> Result<Vec<ProductTag>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .product_tags
            .values()
            .filter(|pt| pt.product_id == id)
            .copied()
            .collect())
    }

    async fn apply_tag_changes(
        &self,
        delete: &[ProductTagId],
        insert: &[NewProductTag],
    ) -> Result<(u64, Vec<ProductTag>), RepositoryError> {
        let mut tables = self.tables.write().await;

        // Inserts are checked against the post-delete state; a failed check
        // puts the deleted rows back.
        let removed: Vec<ProductTag> = delete
            .iter()
            .filter_map(|id| tables.product_tags.remove(id))
            .collect();

        if let Err(e) = tables.check_new_tags(insert) {
            for pt in removed {
                tables.product_tags.insert(pt.id, pt);
            }
            return Err(e);
        }

        let inserted = tables.insert_tags(insert);
        Ok((u64::try_from(removed.len()).unwrap_or(u64::MAX), inserted))
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<CategoryDetails>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .values()
            .map(|c| category_details(&tables, c))
            .collect())
    }

    async fn get_category(
        &self,
        id: CategoryId,
    ) -> Result<Option<CategoryDetails>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .get(&id)
            .map(|c| category_details(&tables, c)))
    }

    async fn create_category(&self, name: &str) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.write().await;
        let category = Category {
            id: CategoryId::new(next(&mut tables.sequences.category)),
            name: name.to_owned(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        name: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.categories.get_mut(&id).map(|category| {
            name.clone_into(&mut category.name);
            category.clone()
        }))
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        for product in tables.products.values_mut() {
            if product.category_id == Some(id) {
                product.category_id = None;
            }
        }
        Ok(tables.categories.remove(&id).is_some())
    }
}

fn category_details(tables: &Tables, category: &Category) -> CategoryDetails {
    CategoryDetails {
        category: category.clone(),
        products: tables
            .products
            .values()
            .filter(|p| p.category_id == Some(category.id))
            .cloned()
            .collect(),
    }
}

#[async_trait]
impl TagStore for MemoryStore {
    async fn list_tags(&self) -> Result<Vec<TagDetails>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.tags.values().map(|t| tag_details(&tables, t)).collect())
    }

    async fn get_tag(&self, id: TagId) -> Result<Option<TagDetails>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.tags.get(&id).map(|t| tag_details(&tables, t)))
    }

    async fn create_tag(&self, name: &str) -> Result<Tag, RepositoryError> {
        let mut tables = self.tables.write().await;
        let tag = Tag {
            id: TagId::new(next(&mut tables.sequences.tag)),
            name: name.to_owned(),
        };
        tables.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn update_tag(&self, id: TagId, name: &str) -> Result<Option<Tag>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.tags.get_mut(&id).map(|tag| {
            name.clone_into(&mut tag.name);
            tag.clone()
        }))
    }

    async fn delete_tag(&self, id: TagId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.product_tags.retain(|_, pt| pt.tag_id != id);
        Ok(tables.tags.remove(&id).is_some())
    }
}

fn tag_details(tables: &Tables, tag: &Tag) -> TagDetails {
    let mut products: Vec<Product> = tables
        .product_tags
        .values()
        .filter(|pt| pt.tag_id == tag.id)
        .filter_map(|pt| tables.products.get(&pt.product_id))
        .cloned()
        .collect();
    products.sort_by_key(|p| p.id);

    TagDetails {
        tag: tag.clone(),
        products,
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn find_cart_entry(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartEntry>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .carts
            .values()
            .find(|e| e.user_id == user_id && e.product_id == product_id)
            .copied())
    }

    async fn create_cart_entry(
        &self,
        user_id: UserId,
        product_id: ProductId,
        amount: i32,
    ) -> Result<CartEntry, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.products.contains_key(&product_id) || !tables.users.contains_key(&user_id) {
            return Err(RepositoryError::NotFound);
        }

        if let Some(existing) = tables
            .carts
            .values_mut()
            .find(|e| e.user_id == user_id && e.product_id == product_id)
        {
            existing.amount = existing
                .amount
                .checked_add(amount)
                .ok_or_else(|| RepositoryError::Conflict("cart amount overflow".to_owned()))?;
            return Ok(*existing);
        }

        let entry = CartEntry {
            id: CartEntryId::new(next(&mut tables.sequences.cart)),
            user_id,
            product_id,
            amount,
        };
        tables.carts.insert(entry.id, entry);
        Ok(entry)
    }

    async fn update_cart_amount(
        &self,
        id: CartEntryId,
        amount: i32,
    ) -> Result<(), RepositoryError> {
        if amount < 1 {
            return Err(RepositoryError::Conflict(
                "cart amount must be at least 1".to_owned(),
            ));
        }
        let mut tables = self.tables.write().await;
        let entry = tables.carts.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        entry.amount = amount;
        Ok(())
    }

    async fn delete_cart_entry(&self, id: CartEntryId) -> Result<(), RepositoryError> {
        self.tables.write().await.carts.remove(&id);
        Ok(())
    }

    async fn list_cart(&self, user_id: UserId) -> Result<Vec<CartEntry>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .carts
            .values()
            .filter(|e| e.user_id == user_id)
            .copied()
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|c| &c.user.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let user = User {
            id: UserId::new(next(&mut tables.sequences.user)),
            email: email.clone(),
            created_at: Utc::now(),
        };
        tables.users.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                password_hash: password_hash.to_owned(),
            },
        );
        Ok(user)
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|c| &c.user.email == email)
            .cloned())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn no_tags() -> BTreeSet<TagId> {
        BTreeSet::new()
    }

    fn fields(name: &str) -> ProductFields {
        ProductFields {
            name: name.to_owned(),
            price: Decimal::new(1999, 2),
            stock: 5,
            category_id: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_product_tag_is_conflict() {
        let store = MemoryStore::new();
        let tag = store.create_tag("red").await.unwrap();
        let (product, _) = store
            .create_product(&fields("Hat"), &BTreeSet::from([tag.id]))
            .await
            .unwrap();
        let row = NewProductTag {
            product_id: product.id,
            tag_id: tag.id,
        };

        let err = store.apply_tag_changes(&[], &[row]).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_unknown_references_are_not_found() {
        let store = MemoryStore::new();
        let mut body = fields("Hat");
        body.category_id = Some(CategoryId::new(99));
        assert!(matches!(
            store.create_product(&body, &no_tags()).await,
            Err(RepositoryError::NotFound)
        ));

        let (product, _) = store.create_product(&fields("Hat"), &no_tags()).await.unwrap();
        let row = NewProductTag {
            product_id: product.id,
            tag_id: TagId::new(42),
        };
        assert!(matches!(
            store.apply_tag_changes(&[], &[row]).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_create_with_unknown_tag_writes_nothing() {
        let store = MemoryStore::new();
        let tag = store.create_tag("red").await.unwrap();

        let err = store
            .create_product(&fields("Hat"), &BTreeSet::from([tag.id, TagId::new(99)]))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        assert!(store.list_products().await.unwrap().is_empty());
        assert!(store.tables.read().await.product_tags.is_empty());

        let (product, rows) = store
            .create_product(&fields("Hat"), &BTreeSet::from([tag.id]))
            .await
            .unwrap();
        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].product_id, product.id);
    }

    #[tokio::test]
    async fn test_failed_tag_change_rolls_back_deletes() {
        let store = MemoryStore::new();
        let tag = store.create_tag("red").await.unwrap();
        let (product, created) = store
            .create_product(&fields("Hat"), &BTreeSet::from([tag.id]))
            .await
            .unwrap();

        let bogus = NewProductTag {
            product_id: product.id,
            tag_id: TagId::new(404),
        };
        let ids: Vec<ProductTagId> = created.iter().map(|pt| pt.id).collect();
        assert!(store.apply_tag_changes(&ids, &[bogus]).await.is_err());

        assert_eq!(store.list_product_tags(product.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_delete_category_detaches_products() {
        let store = MemoryStore::new();
        let category = store.create_category("Hats").await.unwrap();
        let mut body = fields("Cap");
        body.category_id = Some(category.id);
        let (product, _) = store.create_product(&body, &no_tags()).await.unwrap();

        assert!(store.delete_category(category.id).await.unwrap());
        let details = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(details.product.category_id, None);
        assert!(details.category.is_none());
    }

    #[tokio::test]
    async fn test_delete_tag_removes_join_rows() {
        let store = MemoryStore::new();
        let tag = store.create_tag("blue").await.unwrap();
        let (product, _) = store
            .create_product(&fields("Cap"), &BTreeSet::from([tag.id]))
            .await
            .unwrap();

        assert!(store.delete_tag(tag.id).await.unwrap());
        assert!(store.list_product_tags(product.id).await.unwrap().is_empty());
        assert!(!store.delete_tag(tag.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = MemoryStore::new();
        let email = Email::parse("a@b.io").unwrap();
        store.create_user(&email, "hash").await.unwrap();
        assert!(matches!(
            store.create_user(&email, "hash").await,
            Err(RepositoryError::Conflict(_))
        ));
    }
}
