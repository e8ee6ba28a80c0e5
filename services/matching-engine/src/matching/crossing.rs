//! Crossing detection
//!
//! A buy crosses a resting ask when its limit is at or above the ask
//! price; a sell crosses a resting bid when its limit is at or below.
//! Market orders carry no limit and cross any level.

use types::numeric::Price;
use types::order::Side;

/// Can an incoming order on `side` with `limit` execute at `level_price`?
pub fn price_allows(side: Side, limit: Option<Price>, level_price: Price) -> bool {
    match (side, limit) {
        (_, None) => true,
        (Side::Buy, Some(limit)) => level_price <= limit,
        (Side::Sell, Some(limit)) => level_price >= limit,
    }
}
