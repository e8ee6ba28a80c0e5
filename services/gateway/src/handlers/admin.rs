//! Test-convenience admin hooks

use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

/// Flush the vault cache so end-to-end runs start deterministic.
pub async fn clear_cache(State(state): State<AppState>) -> Json<Value> {
    state.engine.clear_cache().await;
    Json(json!({ "status": "cache_cleared" }))
}
