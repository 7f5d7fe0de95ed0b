//! Order intake and lookup endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::{OrderId, UserId};
use domain::{LineItem, Order, OrderDraft, ShippingInfo};
use intake::OrderIntakeService;
use serde::Serialize;
use store::{CartStore, InteractionStore, ProductStore};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub intake: OrderIntakeService,
    pub products: Arc<dyn ProductStore>,
    pub carts: Arc<dyn CartStore>,
    pub interactions: Arc<dyn InteractionStore>,
}

// -- Response types --

/// Full order as the storefront expects it: `orderId` renamed to `id`,
/// monetary amounts as plain JSON numbers in dollars.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItemResponse>,
    pub total: f64,
    pub status: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<String>,
    pub shipping_info: ShippingInfo,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: String,
    pub quantity: u32,
    pub product: OrderItemProductResponse,
}

#[derive(Serialize)]
pub struct OrderItemProductResponse {
    pub name: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResponse {
    pub order_id: String,
    pub status: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        OrderResponse {
            id: order.order_id.to_string(),
            user_id: order.user_id.to_string(),
            items: order.items.into_iter().map(OrderItemResponse::from).collect(),
            total: order.total.as_f64_dollars(),
            status: order.status.as_str().to_string(),
            created_at: order.created_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            processed_at: order
                .processed_at
                .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
            shipping_info: order.shipping_info,
        }
    }
}

impl From<LineItem> for OrderItemResponse {
    fn from(item: LineItem) -> Self {
        OrderItemResponse {
            product_id: item.product_id.to_string(),
            quantity: item.quantity,
            product: OrderItemProductResponse {
                name: item.product.name,
                price: item.product.price.as_f64_dollars(),
                category: item.product.category,
            },
        }
    }
}

// -- Handlers --

/// POST /orders — validate and create a new order.
#[tracing::instrument(skip(state, draft))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<OrderDraft>,
) -> Result<Json<OrderCreatedResponse>, ApiError> {
    let receipt = state.intake.create_order(draft).await?;

    Ok(Json(OrderCreatedResponse {
        order_id: receipt.order_id.to_string(),
        status: receipt.status.as_str().to_string(),
    }))
}

/// GET /orders/:id — load a single order.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.intake.get_order(order_id).await?;
    Ok(Json(OrderResponse::from(order)))
}

/// GET /orders?userId= — list a user's orders, newest first.
#[tracing::instrument(skip(state, params))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let user_id = params
        .get("userId")
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest("userId parameter required".to_string()))?;

    let orders = state
        .intake
        .list_orders_for_user(&UserId::new(user_id.as_str()))
        .await?;

    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
