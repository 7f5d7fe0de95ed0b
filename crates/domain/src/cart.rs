//! Per-user shopping cart record.

use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};

/// A single cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A user's cart: an item list keyed by user.
///
/// Cart mutations are read-modify-write and accept lost updates under
/// concurrent requests for the same user; order correctness never
/// depends on the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Creates an empty cart for a user.
    pub fn empty(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            items: Vec::new(),
        }
    }

    /// Adds a quantity of a product, merging with an existing entry.
    pub fn add_item(&mut self, product_id: ProductId, quantity: u32) {
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => item.quantity += quantity,
            None => self.items.push(CartItem {
                product_id,
                quantity,
            }),
        }
    }

    /// Sets the quantity of a product; zero removes the entry.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove_item(product_id);
            return;
        }
        match self.items.iter_mut().find(|i| &i.product_id == product_id) {
            Some(item) => item.quantity = quantity,
            None => self.items.push(CartItem {
                product_id: product_id.clone(),
                quantity,
            }),
        }
    }

    /// Removes a product from the cart. Removing an absent product is
    /// a no-op.
    pub fn remove_item(&mut self, product_id: &ProductId) {
        self.items.retain(|i| &i.product_id != product_id);
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Returns true if the cart holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
