//! REST request and response bodies

use serde::{Deserialize, Serialize};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, OrderType, Side, TimeInForce};
use types::pair::AssetPair;
use types::trade::Trade;

/// Order submission body: the order fields plus a detached base64
/// signature over the canonical form.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitOrderRequest {
    /// Client-chosen unique id; generated when omitted.
    #[serde(default)]
    pub order_id: Option<String>,
    pub user_address: String,
    pub asset_pair: AssetPair,
    pub side: Side,
    pub order_type: OrderType,
    #[serde(default)]
    pub price: Option<Price>,
    pub quantity: Quantity,
    pub time_in_force: TimeInForce,
    /// Unix seconds; engine wall clock when omitted. Only a tiebreaker
    /// echo, never an ordering input.
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub signature: String,
}

impl SubmitOrderRequest {
    pub fn into_order(self, default_timestamp: i64) -> (Order, String) {
        let order = Order {
            order_id: self
                .order_id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            user_address: self.user_address,
            asset_pair: self.asset_pair,
            side: self.side,
            order_type: self.order_type,
            price: self.price,
            quantity: self.quantity,
            filled_quantity: Quantity::zero(),
            time_in_force: self.time_in_force,
            timestamp: self.timestamp.unwrap_or(default_timestamp),
            sequence: 0,
            status: OrderStatus::Pending,
            signature: String::new(),
        };
        (order, self.signature)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitOrderResponse {
    pub order_id: String,
    pub status: OrderStatus,
    pub trades: Vec<Trade>,
}

/// Signed cancellation envelope; must match the order's account.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelOrderRequest {
    pub user_address: String,
    pub timestamp: i64,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelOrderResponse {
    pub order_id: String,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceQuery {
    pub user_address: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    pub user_address: String,
    pub token: String,
    /// Resolved token contract address.
    pub contract_id: String,
    /// Integer stroops.
    pub balance_raw: i128,
    /// Decimal units.
    pub balance: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderQuery {
    /// Accepted for interface compatibility; the engine trades one pair.
    #[serde(default)]
    pub asset_pair: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: i64,
}
