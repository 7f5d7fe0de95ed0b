//! The fulfillment job carried on the work queue.

use common::{Money, OrderId, UserId};
use serde::{Deserialize, Serialize};

use crate::order::{LineItem, Order, ShippingInfo};

/// Snapshot of an order sufficient to drive fulfillment without
/// re-reading the order at dispatch time.
///
/// Created once per successful order persist and consumed at-least-once
/// by the worker; the queue owns durability, visibility, and retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentJob {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub total: Money,
    pub items: Vec<LineItem>,
    pub shipping_info: ShippingInfo,
}

impl FulfillmentJob {
    /// Builds the job snapshot for a freshly created order.
    pub fn for_order(order: &Order) -> Self {
        Self {
            order_id: order.order_id,
            user_id: order.user_id.clone(),
            total: order.total,
            items: order.items.clone(),
            shipping_info: order.shipping_info.clone(),
        }
    }
}
