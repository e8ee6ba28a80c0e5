//! Order lifecycle types

use crate::numeric::{Price, Quantity};
use crate::pair::AssetPair;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "Buy"),
            Side::Sell => write!(f, "Sell"),
        }
    }
}

/// Order pricing mode
///
/// A market order behaves as a limit order with an unbounded price limit,
/// but it may never rest in the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Limit => write!(f, "Limit"),
            OrderType::Market => write!(f, "Market"),
        }
    }
}

/// Time-in-force policy for orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-Till-Cancel: residual rests in the book
    GTC,
    /// Immediate-Or-Cancel: residual is dropped, never rests
    IOC,
    /// Fill-Or-Kill: full execution or outright rejection, no state change
    FOK,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeInForce::GTC => write!(f, "GTC"),
            TimeInForce::IOC => write!(f, "IOC"),
            TimeInForce::FOK => write!(f, "FOK"),
        }
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted, no fills yet
    Pending,
    /// Some fills, remainder live or dropped per time-in-force
    PartiallyFilled,
    /// Completely executed (terminal)
    Filled,
    /// Removed by the owner or by time-in-force (terminal)
    Cancelled,
    /// Failed admission (terminal)
    Rejected,
}

impl OrderStatus {
    /// Terminal orders stay queryable but never rest in the book.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// A signed limit or market order.
///
/// `sequence` is assigned by the engine at acceptance and is the only
/// in-book tiebreaker; the client `timestamp` is echoed on trade records
/// but never used for ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub user_address: String,
    pub asset_pair: AssetPair,
    pub side: Side,
    pub order_type: OrderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    pub quantity: Quantity,
    #[serde(default = "Quantity::zero")]
    pub filled_quantity: Quantity,
    pub time_in_force: TimeInForce,
    pub timestamp: i64,
    #[serde(default)]
    pub sequence: u64,
    #[serde(default = "default_status")]
    pub status: OrderStatus,
    #[serde(default)]
    pub signature: String,
}

fn default_status() -> OrderStatus {
    OrderStatus::Pending
}

impl Order {
    /// Unfilled remainder.
    pub fn remaining(&self) -> Quantity {
        self.quantity.saturating_sub(self.filled_quantity)
    }

    pub fn is_filled(&self) -> bool {
        self.filled_quantity >= self.quantity
    }

    /// Record a fill and advance the status.
    ///
    /// # Panics
    /// Panics if the fill exceeds the remaining quantity.
    pub fn add_fill(&mut self, fill: Quantity) {
        let new_filled = self.filled_quantity + fill;
        assert!(
            new_filled <= self.quantity,
            "fill would exceed order quantity"
        );
        self.filled_quantity = new_filled;
        self.refresh_fill_status();
    }

    /// Reverse a previously recorded fill (settlement compensation path).
    ///
    /// # Panics
    /// Panics if more than the filled quantity would be reversed.
    pub fn remove_fill(&mut self, fill: Quantity) {
        assert!(
            fill <= self.filled_quantity,
            "cannot reverse more than was filled"
        );
        self.filled_quantity = self.filled_quantity - fill;
        self.refresh_fill_status();
    }

    fn refresh_fill_status(&mut self) {
        if self.is_filled() {
            self.status = OrderStatus::Filled;
        } else if self.filled_quantity.is_positive() {
            self.status = OrderStatus::PartiallyFilled;
        } else {
            self.status = OrderStatus::Pending;
        }
    }

    pub fn cancel(&mut self) {
        self.status = OrderStatus::Cancelled;
    }
}
