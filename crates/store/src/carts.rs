//! Cart store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::UserId;
use domain::Cart;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};

/// Key-value store for per-user cart contents.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Fetches a user's cart, if one exists.
    async fn get(&self, user_id: &UserId) -> Result<Option<Cart>>;

    /// Writes the full cart record, creating it if absent.
    async fn put(&self, cart: &Cart) -> Result<()>;

    /// Empties the user's cart by setting its item list to empty.
    /// Upserts, so clearing an absent cart is a no-op that leaves an
    /// empty record behind.
    async fn clear(&self, user_id: &UserId) -> Result<()>;
}

/// In-memory cart store for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<UserId, Cart>>>,
    fail_on_clear: Arc<AtomicBool>,
}

impl InMemoryCartStore {
    /// Creates a new empty in-memory cart store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to fail `clear` calls.
    pub fn set_fail_on_clear(&self, fail: bool) {
        self.fail_on_clear.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<Cart>> {
        Ok(self.carts.read().await.get(user_id).cloned())
    }

    async fn put(&self, cart: &Cart) -> Result<()> {
        self.carts
            .write()
            .await
            .insert(cart.user_id.clone(), cart.clone());
        Ok(())
    }

    async fn clear(&self, user_id: &UserId) -> Result<()> {
        if self.fail_on_clear.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                service: "cart store",
                reason: "simulated clear failure".to_string(),
            });
        }
        self.carts
            .write()
            .await
            .insert(user_id.clone(), Cart::empty(user_id.clone()));
        Ok(())
    }
}
