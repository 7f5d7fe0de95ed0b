//! Boundary types for order creation requests.
//!
//! A creation payload is deserialized into [`OrderDraft`] with every
//! field optional, then checked eagerly and fully by
//! [`OrderDraft::validate`] before any write happens. Validation is the
//! single place where wire-level floating-point amounts become exact
//! [`Money`] cents.

use common::{Money, ProductId, UserId};
use serde::Deserialize;

use crate::error::ValidationError;
use crate::order::{LineItem, ProductSnapshot, ShippingInfo};

/// Raw order creation payload as received from the storefront.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub user_id: Option<String>,
    pub items: Option<Vec<LineItemDraft>>,
    pub total: Option<f64>,
    pub shipping_info: Option<ShippingInfoDraft>,
}

/// Raw line item within a creation payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemDraft {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub product: Option<ProductSnapshotDraft>,
}

fn default_quantity() -> u32 {
    1
}

/// Raw product snapshot within a creation payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshotDraft {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
}

/// Raw shipping details within a creation payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfoDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
}

/// A fully validated creation request, ready to become an order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOrder {
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub total: Money,
    pub shipping_info: ShippingInfo,
}

impl OrderDraft {
    /// Validates the draft, reporting the first missing field.
    ///
    /// Top-level fields are checked in the order `userId`, `items`,
    /// `total`, `shippingInfo`; shipping sub-fields in the order
    /// `name`, `email`, `address`, `city`, `zipCode`. An empty string
    /// or empty item list counts as missing.
    pub fn validate(self) -> Result<ValidatedOrder, ValidationError> {
        let user_id = match self.user_id {
            Some(ref id) if !id.is_empty() => UserId::new(id.clone()),
            _ => return Err(ValidationError::MissingField("userId")),
        };

        let items = match self.items {
            Some(items) if !items.is_empty() => items,
            _ => return Err(ValidationError::MissingField("items")),
        };

        let total = match self.total {
            Some(total) => Money::from_f64_dollars(total),
            None => return Err(ValidationError::MissingField("total")),
        };

        let shipping = self
            .shipping_info
            .ok_or(ValidationError::MissingField("shippingInfo"))?;
        let shipping_info = shipping.validate()?;

        let items = items.into_iter().map(LineItemDraft::into_line_item).collect();

        Ok(ValidatedOrder {
            user_id,
            items,
            total,
            shipping_info,
        })
    }
}

impl LineItemDraft {
    fn into_line_item(self) -> LineItem {
        let product = match self.product {
            Some(snapshot) => ProductSnapshot {
                name: snapshot
                    .name
                    .unwrap_or_else(|| "Unknown Product".to_string()),
                price: snapshot.price.map(Money::from_f64_dollars).unwrap_or_default(),
                category: snapshot.category,
            },
            None => ProductSnapshot::unknown(),
        };

        LineItem {
            product_id: ProductId::new(self.product_id),
            quantity: self.quantity,
            product,
        }
    }
}

impl ShippingInfoDraft {
    fn validate(self) -> Result<ShippingInfo, ValidationError> {
        fn required(
            value: Option<String>,
            field: &'static str,
        ) -> Result<String, ValidationError> {
            match value {
                Some(v) if !v.is_empty() => Ok(v),
                _ => Err(ValidationError::MissingShippingField(field)),
            }
        }

        Ok(ShippingInfo {
            name: required(self.name, "name")?,
            email: required(self.email, "email")?,
            address: required(self.address, "address")?,
            city: required(self.city, "city")?,
            zip_code: required(self.zip_code, "zipCode")?,
        })
    }
}
