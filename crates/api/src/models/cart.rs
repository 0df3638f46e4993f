//! Cart entry type.

use serde::{Deserialize, Serialize};

use shopfloor_core::{CartEntryId, ProductId, UserId};

/// Quantity of one product in one user's cart.
///
/// A row only exists while `amount >= 1`; there is at most one per
/// `(user_id, product_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub id: CartEntryId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub amount: i32,
}
