//! Behavioral interaction events.

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The kind of storefront interaction being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "product-view")]
    ProductView,
    #[serde(rename = "add-to-cart")]
    AddToCart,
    #[serde(rename = "purchase")]
    Purchase,
}

impl EventType {
    /// Returns the wire representation of the event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ProductView => "product-view",
            EventType::AddToCart => "add-to-cart",
            EventType::Purchase => "purchase",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product-view" => Ok(EventType::ProductView),
            "add-to-cart" => Ok(EventType::AddToCart),
            "purchase" => Ok(EventType::Purchase),
            other => Err(ValidationError::InvalidEventType(other.to_string())),
        }
    }
}

/// An append-only record of one user interaction, keyed by user + time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub event_type: EventType,
    /// Product category the storefront sent as `productType`.
    pub category: String,
    pub timestamp: DateTime<Utc>,
}

impl InteractionEvent {
    /// Creates an event stamped with the current UTC instant.
    pub fn now(
        user_id: impl Into<UserId>,
        product_id: impl Into<ProductId>,
        event_type: EventType,
        category: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            product_id: product_id.into(),
            event_type,
            category: category.into(),
            timestamp: Utc::now(),
        }
    }
}
