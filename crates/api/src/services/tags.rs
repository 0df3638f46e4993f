//! Product/tag reconciliation.
//!
//! An update names the full set of tags a product should carry. Rather than
//! dropping and rewriting every join row, the reconciler computes the smallest
//! change: rows whose tag left the set are deleted by id, tags new to the set
//! get a fresh row, and everything else is left untouched.

use std::collections::{BTreeSet, HashSet};

use shopfloor_core::{ProductId, ProductTagId, TagId};

use crate::models::{NewProductTag, ProductTag};

/// The delete and insert halves of one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagReconciliation {
    /// Existing join rows to remove.
    pub to_delete: Vec<ProductTagId>,
    /// Join rows to create.
    pub to_insert: Vec<NewProductTag>,
}

impl TagReconciliation {
    /// True when the current rows already match the desired set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_insert.is_empty()
    }
}

/// Diff a product's current join rows against the desired tag set.
///
/// If `current` holds the same tag more than once, the first row is kept and
/// the rest are deleted, so no duplicate pair survives.
#[must_use]
pub fn reconcile(
    product_id: ProductId,
    current: &[ProductTag],
    desired: &BTreeSet<TagId>,
) -> TagReconciliation {
    let mut kept: HashSet<TagId> = HashSet::with_capacity(current.len());
    let mut to_delete = Vec::new();

    for row in current {
        if desired.contains(&row.tag_id) && kept.insert(row.tag_id) {
            continue;
        }
        to_delete.push(row.id);
    }

    let to_insert = desired
        .iter()
        .filter(|tag_id| !kept.contains(tag_id))
        .map(|&tag_id| NewProductTag { product_id, tag_id })
        .collect();

    TagReconciliation {
        to_delete,
        to_insert,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT: ProductId = ProductId::new(1);

    fn rows(pairs: &[(i32, i32)]) -> Vec<ProductTag> {
        pairs
            .iter()
            .map(|&(id, tag)| ProductTag {
                id: ProductTagId::new(id),
                product_id: PRODUCT,
                tag_id: TagId::new(tag),
            })
            .collect()
    }

    fn tags(ids: &[i32]) -> BTreeSet<TagId> {
        ids.iter().copied().map(TagId::new).collect()
    }

    /// Apply a reconciliation to an in-memory row list, assigning ids from `next_id`.
    fn apply(current: &[ProductTag], plan: &TagReconciliation, next_id: i32) -> Vec<ProductTag> {
        let mut out: Vec<ProductTag> = current
            .iter()
            .filter(|r| !plan.to_delete.contains(&r.id))
            .copied()
            .collect();
        for (offset, new) in (0..).zip(&plan.to_insert) {
            out.push(ProductTag {
                id: ProductTagId::new(next_id + offset),
                product_id: new.product_id,
                tag_id: new.tag_id,
            });
        }
        out
    }

    #[test]
    fn test_swap_one_tag() {
        // rows 10 -> tag 1, 11 -> tag 2; desired {2, 3}
        let current = rows(&[(10, 1), (11, 2)]);
        let plan = reconcile(PRODUCT, &current, &tags(&[2, 3]));

        assert_eq!(plan.to_delete, vec![ProductTagId::new(10)]);
        assert_eq!(
            plan.to_insert,
            vec![NewProductTag {
                product_id: PRODUCT,
                tag_id: TagId::new(3)
            }]
        );
    }

    #[test]
    fn test_second_pass_is_noop() {
        let current = rows(&[(10, 1), (11, 2), (12, 5)]);
        let desired = tags(&[2, 3, 4]);

        let first = reconcile(PRODUCT, &current, &desired);
        let after = apply(&current, &first, 100);
        let second = reconcile(PRODUCT, &after, &desired);

        assert!(second.is_empty());
        let resulting: BTreeSet<TagId> = after.iter().map(|r| r.tag_id).collect();
        assert_eq!(resulting, desired);
    }

    #[test]
    fn test_empty_desired_clears_everything() {
        let current = rows(&[(10, 1), (11, 2)]);
        let plan = reconcile(PRODUCT, &current, &BTreeSet::new());

        assert_eq!(
            plan.to_delete,
            vec![ProductTagId::new(10), ProductTagId::new(11)]
        );
        assert!(plan.to_insert.is_empty());
    }

    #[test]
    fn test_no_current_rows_inserts_all() {
        let plan = reconcile(PRODUCT, &[], &tags(&[3, 1]));
        let inserted: Vec<TagId> = plan.to_insert.iter().map(|r| r.tag_id).collect();

        assert!(plan.to_delete.is_empty());
        assert_eq!(inserted, vec![TagId::new(1), TagId::new(3)]);
    }

    #[test]
    fn test_duplicate_current_rows_are_collapsed() {
        let current = rows(&[(10, 2), (11, 2)]);
        let plan = reconcile(PRODUCT, &current, &tags(&[2]));

        assert_eq!(plan.to_delete, vec![ProductTagId::new(11)]);
        assert!(plan.to_insert.is_empty());
    }
}
