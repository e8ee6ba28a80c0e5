//! Order submission, lookup, and cancellation

use crate::error::{engine_status, ApiError, ApiJson};
use crate::handlers::unix_now;
use crate::models::{
    CancelOrderRequest, CancelOrderResponse, OrderQuery, SubmitOrderRequest, SubmitOrderResponse,
};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use types::order::Order;

pub async fn create_order(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SubmitOrderRequest>,
) -> Result<Response, ApiError> {
    state.rate_limiter.check(
        &format!("{}:order_placement", request.user_address),
        20,
        20.0,
    )?;

    let (order, signature) = request.into_order(unix_now());
    let outcome = state.engine.submit(order, &signature).await?;

    let response = SubmitOrderResponse {
        order_id: outcome.order.order_id.clone(),
        status: outcome.order.status,
        trades: outcome.trades,
    };

    // A settlement failure after matching is reported with the trades so
    // the compensated state is never silent.
    if let Some(error) = outcome.error {
        let status = engine_status(&error);
        let body = json!({
            "detail": error.to_string(),
            "order_id": response.order_id,
            "status": response.status,
            "trades": response.trades,
        });
        return Ok((status, Json(body)).into_response());
    }

    Ok((StatusCode::OK, Json(response)).into_response())
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Query(_query): Query<OrderQuery>,
) -> Result<Json<Order>, ApiError> {
    state
        .engine
        .get_order(&order_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("order not found: {order_id}")))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    ApiJson(request): ApiJson<CancelOrderRequest>,
) -> Result<Json<CancelOrderResponse>, ApiError> {
    state.rate_limiter.check(
        &format!("{}:order_cancel", request.user_address),
        50,
        50.0,
    )?;

    auth::verify_cancellation(
        &order_id,
        &request.user_address,
        request.timestamp,
        &request.signature,
    )
    .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let order = state.engine.cancel(&order_id, &request.user_address).await?;

    Ok(Json(CancelOrderResponse {
        order_id,
        status: order.status,
    }))
}
