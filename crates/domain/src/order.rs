//! The order record and its status state machine.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Transitions:
/// ```text
/// Pending ──[payment ok, marked processed]──► Processed
/// Pending ──[payment declined]─────────────► PaymentFailed
/// ```
///
/// Both `Processed` and `PaymentFailed` are terminal. There is no
/// in-progress state; a worker crash mid-fulfillment leaves the order
/// at `Pending` until the queue redelivers the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order persisted, awaiting fulfillment.
    #[default]
    #[serde(rename = "PENDING")]
    Pending,

    /// Fulfillment completed (terminal).
    #[serde(rename = "PROCESSED")]
    Processed,

    /// Payment was declined (terminal).
    #[serde(rename = "PAYMENT_FAILED")]
    PaymentFailed,
}

impl OrderStatus {
    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Processed | OrderStatus::PaymentFailed)
    }

    /// Returns the wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processed => "PROCESSED",
            OrderStatus::PaymentFailed => "PAYMENT_FAILED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PROCESSED" => Ok(OrderStatus::Processed),
            "PAYMENT_FAILED" => Ok(OrderStatus::PaymentFailed),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Denormalized product details captured on a line item at creation
/// time, used for receipts, emails, and invoices without re-reading
/// the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    /// Human-readable product name.
    pub name: String,

    /// Unit price in exact cents.
    pub price: Money,

    /// Product category, when the storefront supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ProductSnapshot {
    /// Placeholder snapshot used when the storefront sent an item
    /// without product details.
    pub fn unknown() -> Self {
        Self {
            name: "Unknown Product".to_string(),
            price: Money::zero(),
            category: None,
        }
    }
}

/// A single line item of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// The product being ordered.
    pub product_id: ProductId,

    /// Quantity ordered.
    pub quantity: u32,

    /// Product details as they were at order time.
    pub product: ProductSnapshot,
}

impl LineItem {
    /// Creates a new line item.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32, product: ProductSnapshot) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            product,
        }
    }

    /// Returns the total price for this line (quantity * unit price).
    pub fn line_total(&self) -> Money {
        self.product.price.multiply(self.quantity)
    }
}

/// Shipping and contact details captured at order creation.
///
/// All fields are required and immutable once the order exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
}

/// A customer's purchase request plus its fulfillment state.
///
/// Created by the intake service with status `Pending`; mutated only by
/// the fulfillment worker, which transitions the status and stamps
/// `processed_at`; never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Globally unique order identifier, assigned at creation.
    pub order_id: OrderId,

    /// The purchasing user.
    pub user_id: UserId,

    /// Ordered line items.
    pub items: Vec<LineItem>,

    /// Order total in exact cents.
    pub total: Money,

    /// Current lifecycle status.
    pub status: OrderStatus,

    /// Creation instant (UTC), immutable.
    pub created_at: DateTime<Utc>,

    /// Set once fulfillment completes or fails terminally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,

    /// Shipping and contact details, immutable.
    pub shipping_info: ShippingInfo,
}
