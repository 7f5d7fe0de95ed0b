//! The order intake service.

use std::sync::Arc;

use chrono::Utc;
use common::{OrderId, UserId};
use domain::{FulfillmentJob, Order, OrderDraft, OrderStatus};
use store::{OrderStore, WorkQueue};

use crate::error::{IntakeError, Result};

/// What a successful creation returns to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

/// Validates and persists new orders and enqueues their fulfillment
/// jobs; also serves order lookups.
#[derive(Clone)]
pub struct OrderIntakeService {
    orders: Arc<dyn OrderStore>,
    queue: Arc<dyn WorkQueue>,
}

impl OrderIntakeService {
    /// Creates a new intake service over an order store and work queue.
    pub fn new(orders: Arc<dyn OrderStore>, queue: Arc<dyn WorkQueue>) -> Self {
        Self { orders, queue }
    }

    /// Creates a new order from a raw creation payload.
    ///
    /// Validation is checked eagerly and fully before any write. On
    /// success the order is written once with status `PENDING`, then a
    /// fulfillment job is enqueued best-effort: an enqueue failure is
    /// logged and swallowed, leaving the order awaiting manual
    /// re-drive.
    #[tracing::instrument(skip(self, draft))]
    pub async fn create_order(&self, draft: OrderDraft) -> Result<OrderReceipt> {
        let validated = draft.validate()?;

        let order = Order {
            order_id: OrderId::new(),
            user_id: validated.user_id,
            items: validated.items,
            total: validated.total,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            processed_at: None,
            shipping_info: validated.shipping_info,
        };

        self.orders.put(&order).await?;
        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.order_id, user_id = %order.user_id, "order created");

        self.enqueue_job(&order).await;

        Ok(OrderReceipt {
            order_id: order.order_id,
            status: order.status,
        })
    }

    /// Point lookup of a single order.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .get(order_id)
            .await?
            .ok_or(IntakeError::NotFound(order_id))
    }

    /// All orders for a user, newest first; empty for an unknown user.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        Ok(self.orders.list_for_user(user_id).await?)
    }

    async fn enqueue_job(&self, order: &Order) {
        let job = FulfillmentJob::for_order(order);
        let body = match serde_json::to_string(&job) {
            Ok(body) => body,
            Err(error) => {
                metrics::counter!("order_enqueue_failures_total").increment(1);
                tracing::warn!(order_id = %order.order_id, %error, "failed to encode fulfillment job");
                return;
            }
        };

        if let Err(error) = self.queue.send(body).await {
            metrics::counter!("order_enqueue_failures_total").increment(1);
            tracing::warn!(
                order_id = %order.order_id,
                %error,
                "failed to enqueue fulfillment job; order stays PENDING"
            );
        }
    }
}
