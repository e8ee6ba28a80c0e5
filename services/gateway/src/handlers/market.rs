//! Health and order book depth

use crate::error::ApiError;
use crate::handlers::unix_now;
use crate::models::HealthResponse;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use matching_engine::book::BookSnapshot;
use types::pair::AssetPair;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: unix_now(),
    })
}

pub async fn get_orderbook(
    State(state): State<AppState>,
    Path((base, quote)): Path<(String, String)>,
) -> Result<Json<BookSnapshot>, ApiError> {
    let snapshot = state
        .engine
        .snapshot(&AssetPair::new(base, quote))
        .await?;
    Ok(Json(snapshot))
}
