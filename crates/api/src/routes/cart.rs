//! Cart management endpoints.
//!
//! Every mutation answers with the full enriched cart so the
//! storefront never needs a follow-up read. Enrichment joins each
//! entry against the catalog; the running total is computed in exact
//! cents and only converted to dollars in the response.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use common::{Money, ProductId, UserId};
use domain::Cart;
use serde::{Deserialize, Serialize};
use store::{CartStore, ProductStore};

use crate::error::ApiError;
use crate::routes::orders::AppState;
use crate::routes::products::ProductResponse;

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub user_id: String,
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetQuantityRequest {
    pub user_id: String,
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub user_id: String,
    pub items: Vec<CartItemResponse>,
    pub total: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub product_id: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductResponse>,
}

/// GET /cart?userId= — the user's enriched cart; empty if absent.
#[tracing::instrument(skip(state, params))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<CartResponse>, ApiError> {
    let user_id = require_user_id(&params)?;
    let cart = load_cart(&state, &user_id).await?;
    Ok(Json(enrich(&state, cart).await?))
}

/// POST /cart — add a quantity of a product, merging with an existing
/// entry. The product must exist in the catalog.
#[tracing::instrument(skip(state, req))]
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    if req.user_id.is_empty() {
        return Err(ApiError::BadRequest("userId required".to_string()));
    }
    let product_id = ProductId::new(req.product_id);
    if state.products.get(&product_id).await?.is_none() {
        return Err(ApiError::NotFound("Product not found".to_string()));
    }

    let user_id = UserId::new(req.user_id);
    let mut cart = load_cart(&state, &user_id).await?;
    cart.add_item(product_id, req.quantity);
    state.carts.put(&cart).await?;

    Ok(Json(enrich(&state, cart).await?))
}

/// PUT /cart — set the quantity of a product; zero removes the entry.
#[tracing::instrument(skip(state, req))]
pub async fn set_quantity(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetQuantityRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    if req.user_id.is_empty() {
        return Err(ApiError::BadRequest("userId required".to_string()));
    }

    let user_id = UserId::new(req.user_id);
    let mut cart = load_cart(&state, &user_id).await?;
    cart.set_quantity(&ProductId::new(req.product_id), req.quantity);
    state.carts.put(&cart).await?;

    Ok(Json(enrich(&state, cart).await?))
}

/// DELETE /cart?userId=[&productId=] — remove one item, or clear the
/// whole cart when no `productId` is given.
#[tracing::instrument(skip(state, params))]
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<CartResponse>, ApiError> {
    let user_id = require_user_id(&params)?;

    let cart = match params.get("productId").filter(|v| !v.is_empty()) {
        Some(product_id) => {
            let mut cart = load_cart(&state, &user_id).await?;
            cart.remove_item(&ProductId::new(product_id.as_str()));
            state.carts.put(&cart).await?;
            cart
        }
        None => {
            state.carts.clear(&user_id).await?;
            Cart::empty(user_id)
        }
    };

    Ok(Json(enrich(&state, cart).await?))
}

fn require_user_id(params: &HashMap<String, String>) -> Result<UserId, ApiError> {
    params
        .get("userId")
        .filter(|v| !v.is_empty())
        .map(|v| UserId::new(v.as_str()))
        .ok_or_else(|| ApiError::BadRequest("userId parameter required".to_string()))
}

async fn load_cart(state: &AppState, user_id: &UserId) -> Result<Cart, ApiError> {
    Ok(state
        .carts
        .get(user_id)
        .await?
        .unwrap_or_else(|| Cart::empty(user_id.clone())))
}

/// Joins cart entries against the catalog. An entry whose product has
/// left the catalog is kept without enrichment and contributes nothing
/// to the total.
async fn enrich(state: &AppState, cart: Cart) -> Result<CartResponse, ApiError> {
    let mut items = Vec::with_capacity(cart.items.len());
    let mut total = Money::zero();

    for entry in cart.items {
        let product = state.products.get(&entry.product_id).await?;
        if let Some(product) = &product {
            total += product.price.multiply(entry.quantity);
        }
        items.push(CartItemResponse {
            product_id: entry.product_id.to_string(),
            quantity: entry.quantity,
            product: product.map(ProductResponse::from),
        });
    }

    Ok(CartResponse {
        user_id: cart.user_id.to_string(),
        items,
        total: total.as_f64_dollars(),
    })
}
