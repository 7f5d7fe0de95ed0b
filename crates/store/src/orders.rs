//! Order store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{Order, OrderStatus};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};

/// Durable key-value table holding order records, keyed by order id,
/// with a secondary access path by user id.
///
/// An order record has exactly one writer at a time in the intended
/// flow: intake performs the initial `put`, the fulfillment worker the
/// one subsequent `update_status`.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Writes the full order record. Called once per order, at creation.
    async fn put(&self, order: &Order) -> Result<()>;

    /// Point lookup by order id.
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Secondary-index query: all orders for a user, newest first.
    /// Returns an empty list (not an error) for an unknown user.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>>;

    /// Updates the order's status and stamps `processed_at`.
    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        processed_at: DateTime<Utc>,
    ) -> Result<()>;
}

/// In-memory order store for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    fail_on_put: Arc<AtomicBool>,
    fail_on_update_status: Arc<AtomicBool>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Configures the store to fail `put` calls.
    pub fn set_fail_on_put(&self, fail: bool) {
        self.fail_on_put.store(fail, Ordering::SeqCst);
    }

    /// Configures the store to fail `update_status` calls.
    pub fn set_fail_on_update_status(&self, fail: bool) {
        self.fail_on_update_status.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn put(&self, order: &Order) -> Result<()> {
        if self.fail_on_put.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                service: "order store",
                reason: "simulated write failure".to_string(),
            });
        }
        self.orders
            .write()
            .await
            .insert(order.order_id, order.clone());
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> = orders
            .values()
            .filter(|o| &o.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        processed_at: DateTime<Utc>,
    ) -> Result<()> {
        if self.fail_on_update_status.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                service: "order store",
                reason: "simulated update failure".to_string(),
            });
        }
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        order.status = status;
        order.processed_at = Some(processed_at);
        Ok(())
    }
}
