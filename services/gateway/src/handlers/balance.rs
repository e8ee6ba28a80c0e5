//! Vault balance reads

use crate::error::ApiError;
use crate::models::{BalanceQuery, BalanceResponse};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;

pub async fn get_balance(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let view = state
        .engine
        .balance(&query.user_address, &query.token)
        .await?;

    Ok(Json(BalanceResponse {
        user_address: query.user_address,
        token: query.token,
        contract_id: view.token,
        balance_raw: view.balance_raw,
        balance: view.balance.to_string(),
    }))
}
