use crate::handlers::{admin, balance, market, order};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/orders", post(order::create_order))
        .route(
            "/orders/:id",
            get(order::get_order).delete(order::cancel_order),
        )
        .route("/orderbook/:base/:quote", get(market::get_orderbook))
        .route("/balances", get(balance::get_balance))
        .route("/admin/clear_cache", post(admin::clear_cache));

    Router::new()
        .route("/health", get(market::health))
        .nest("/api/v1", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
