//! Interaction event tracking endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use domain::{EventType, InteractionEvent};
use serde::{Deserialize, Serialize};
use store::InteractionStore;

use crate::error::ApiError;
use crate::routes::orders::AppState;

/// Raw tracking payload; the storefront sends the product category as
/// `productType`. The timestamp is optional and stamped server-side
/// when absent.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEventRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct TrackEventResponse {
    pub message: &'static str,
}

/// POST /events — record one behavioral interaction event.
#[tracing::instrument(skip(state, req))]
pub async fn track(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TrackEventRequest>,
) -> Result<Json<TrackEventResponse>, ApiError> {
    let user_id = required(req.user_id, "userId")?;
    let product_id = required(req.product_id, "productId")?;
    let event_type_raw = required(req.event_type, "eventType")?;
    let category = required(req.product_type, "productType")?;

    let event_type: EventType = event_type_raw.parse()?;

    let event = InteractionEvent {
        user_id: user_id.into(),
        product_id: product_id.into(),
        event_type,
        category,
        timestamp: req.timestamp.unwrap_or_else(Utc::now),
    };
    state.interactions.append(&event).await?;

    metrics::counter!("interaction_events_total").increment(1);
    tracing::info!(
        user_id = %event.user_id,
        product_id = %event.product_id,
        event_type = %event.event_type,
        "interaction event tracked"
    );

    Ok(Json(TrackEventResponse {
        message: "Event tracked successfully",
    }))
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("Missing required field: {field}")))
}
