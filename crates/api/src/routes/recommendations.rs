//! Product recommendations endpoint.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use common::UserId;
use store::{InteractionStore, ProductStore};

use crate::error::ApiError;
use crate::routes::orders::AppState;
use crate::routes::products::ProductResponse;

/// How far back into a user's history the heuristic looks.
const RECENT_WINDOW: usize = 20;
/// Cap on the number of recommended products.
const MAX_RECOMMENDATIONS: usize = 10;

/// GET /recommendations?userId= — products from the category of the
/// user's most recent interaction, excluding products the user already
/// interacted with. A user without history gets an empty list.
#[tracing::instrument(skip(state, params))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let user_id = params
        .get("userId")
        .filter(|v| !v.is_empty())
        .map(|v| UserId::new(v.as_str()))
        .ok_or_else(|| ApiError::BadRequest("userId parameter required".to_string()))?;

    let recent = state
        .interactions
        .recent_for_user(&user_id, RECENT_WINDOW)
        .await?;
    let Some(latest) = recent.first() else {
        return Ok(Json(Vec::new()));
    };

    let seen: HashSet<_> = recent.iter().map(|e| e.product_id.clone()).collect();
    let candidates = state.products.list_by_category(&latest.category).await?;

    let recommendations: Vec<ProductResponse> = candidates
        .into_iter()
        .filter(|p| !seen.contains(&p.product_id))
        .take(MAX_RECOMMENDATIONS)
        .map(ProductResponse::from)
        .collect();

    tracing::info!(
        user_id = %user_id,
        category = %latest.category,
        count = recommendations.len(),
        "recommendations computed"
    );

    Ok(Json(recommendations))
}
