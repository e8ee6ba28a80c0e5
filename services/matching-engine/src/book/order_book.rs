//! Price-time priority order book for a single asset pair
//!
//! Resting bids and asks live in price-sorted levels with FIFO queues;
//! within a level, lower engine sequence matches first. The client
//! timestamp is echoed on trades but never orders the book, so timestamp
//! manipulation buys nothing.
//!
//! The book also keeps every order it has ever accepted (terminal orders
//! included) so ids stay queryable for the process lifetime, plus a
//! secondary `order_id → (side, price)` index for direct cancellation.

use crate::book::ask_book::AskBook;
use crate::book::bid_book::BidBook;
use crate::book::price_level::LevelEntry;
use crate::matching::{crossing, executor, SelfTradePolicy};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use types::errors::CancelError;
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderType, Side, TimeInForce};
use types::pair::AssetPair;
use types::trade::Trade;

/// Outcome of a pre-execution scan of the opposite side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanResult {
    /// Quantity executable within the price limit, skipping own orders.
    pub achievable: Quantity,
    /// Exact quote cost of executing `achievable` across the scanned levels.
    pub quote_cost: Decimal,
}

/// What a cancellation freed up, for reservation release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CancelRelease {
    pub side: Side,
    pub price: Price,
    pub remaining: Quantity,
}

/// One aggregated price level in a depth snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DepthLevel {
    pub price: Price,
    pub quantity: Quantity,
    #[serde(rename = "count")]
    pub order_count: usize,
}

/// Top-N depth per side; exposes no per-account information.
#[derive(Debug, Clone, Serialize)]
pub struct BookSnapshot {
    pub pair: AssetPair,
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
    pub timestamp: i64,
}

pub struct OrderBook {
    pair: AssetPair,
    bids: BidBook,
    asks: AskBook,
    /// Every accepted order, live or terminal.
    orders: HashMap<String, Order>,
    /// Resting orders only: id → queue location.
    resting: HashMap<String, (Side, Price)>,
}

impl OrderBook {
    pub fn new(pair: AssetPair) -> Self {
        Self {
            pair,
            bids: BidBook::new(),
            asks: AskBook::new(),
            orders: HashMap::new(),
            resting: HashMap::new(),
        }
    }

    pub fn pair(&self) -> &AssetPair {
        &self.pair
    }

    /// Known in any status, including terminal.
    pub fn contains(&self, order_id: &str) -> bool {
        self.orders.contains_key(order_id)
    }

    pub fn get_order(&self, order_id: &str) -> Option<&Order> {
        self.orders.get(order_id)
    }

    pub(crate) fn order_mut(&mut self, order_id: &str) -> Option<&mut Order> {
        self.orders.get_mut(order_id)
    }

    pub fn is_resting(&self, order_id: &str) -> bool {
        self.resting.contains_key(order_id)
    }

    /// Walk the opposite side best-first and compute how much of
    /// `max_quantity` could execute within `limit`, without touching any
    /// state. `account`'s own orders are skipped; with `stop_at_own` set
    /// (the cancel-newer policy) the first own order ends the scan, since
    /// execution would stop there too.
    ///
    /// Fill-or-kill admission and market-order reservations are both
    /// decided from this scan; under the engine's lock the subsequent
    /// execution consumes exactly the scanned levels.
    pub fn prescan(
        &self,
        side: Side,
        limit: Option<Price>,
        account: &str,
        max_quantity: Quantity,
        stop_at_own: bool,
    ) -> ScanResult {
        match side {
            Side::Buy => scan_levels(
                self.asks.levels_best_first(),
                side,
                limit,
                account,
                max_quantity,
                stop_at_own,
            ),
            Side::Sell => scan_levels(
                self.bids.levels_best_first(),
                side,
                limit,
                account,
                max_quantity,
                stop_at_own,
            ),
        }
    }

    /// Match an accepted order against the book and apply its residual
    /// disposition.
    ///
    /// The caller has already validated the order, checked its id for
    /// uniqueness, assigned its sequence, and (for FOK and market orders)
    /// pre-scanned fillability. Returns the trades produced, oldest first;
    /// the final order view is available via [`Self::get_order`].
    pub fn add(&mut self, mut order: Order, policy: SelfTradePolicy, timestamp: i64) -> Vec<Trade> {
        let limit = match order.order_type {
            OrderType::Limit => order.price,
            OrderType::Market => None,
        };

        let mut trades = Vec::new();
        let mut cancelled_by_policy = false;
        let mut cursor: Option<Price> = None;

        'levels: while order.remaining().is_positive() {
            let next_price = match (order.side, cursor) {
                (Side::Buy, None) => self.asks.best_price(),
                (Side::Buy, Some(p)) => self.asks.next_price_worse(p),
                (Side::Sell, None) => self.bids.best_price(),
                (Side::Sell, Some(p)) => self.bids.next_price_worse(p),
            };
            let Some(level_price) = next_price else {
                break;
            };
            if !crossing::price_allows(order.side, limit, level_price) {
                break;
            }
            cursor = Some(level_price);

            let mut index = 0;
            while order.remaining().is_positive() {
                let level = match order.side {
                    Side::Buy => self.asks.level_mut(level_price),
                    Side::Sell => self.bids.level_mut(level_price),
                };
                let Some(level) = level else { break };
                let Some(entry) = level.get(index) else { break };

                if entry.account == order.user_address {
                    match policy {
                        // Leave the resting order untouched and look past it.
                        SelfTradePolicy::SkipMatch => {
                            index += 1;
                            continue;
                        }
                        // The incoming (newer) order dies; the book stands.
                        SelfTradePolicy::CancelNewer => {
                            cancelled_by_policy = true;
                            break 'levels;
                        }
                    }
                }

                let entry = entry.clone();
                let fill = order.remaining().min(entry.remaining);
                let trade = executor::make_trade(&order, &entry, level_price, fill, timestamp);
                let maker_removed = level.fill_at(index, fill);

                if let Some(maker) = self.orders.get_mut(&entry.order_id) {
                    maker.add_fill(fill);
                }
                if maker_removed {
                    self.resting.remove(&entry.order_id);
                }
                order.add_fill(fill);
                trades.push(trade);
                // A removed maker shifts the next entry into `index`.
            }

            match order.side {
                Side::Buy => self.asks.prune_if_empty(level_price),
                Side::Sell => self.bids.prune_if_empty(level_price),
            }
        }

        match order.side {
            Side::Buy => {
                if let Some(p) = cursor {
                    self.asks.prune_if_empty(p);
                }
            }
            Side::Sell => {
                if let Some(p) = cursor {
                    self.bids.prune_if_empty(p);
                }
            }
        }

        if cancelled_by_policy {
            order.cancel();
        } else if order.remaining().is_positive() {
            match (order.order_type, order.time_in_force) {
                (OrderType::Limit, TimeInForce::GTC) => {
                    let price = order.price.expect("limit order carries a price");
                    let entry = LevelEntry {
                        order_id: order.order_id.clone(),
                        account: order.user_address.clone(),
                        sequence: order.sequence,
                        remaining: order.remaining(),
                    };
                    match order.side {
                        Side::Buy => self.bids.insert(price, entry),
                        Side::Sell => self.asks.insert(price, entry),
                    }
                    self.resting.insert(order.order_id.clone(), (order.side, price));
                }
                // IOC residual is dropped. FOK and market residuals cannot
                // occur after the pre-scan; if one does, dropping it keeps
                // the book consistent.
                _ => {
                    if order.filled_quantity.is_zero() {
                        order.cancel();
                    }
                }
            }
        }

        self.orders.insert(order.order_id.clone(), order);
        trades
    }

    /// Cancel a resting order.
    ///
    /// Terminal (or already non-resting) orders cancel idempotently with
    /// no state change. `NotOwner` when the account does not match.
    pub fn cancel(
        &mut self,
        order_id: &str,
        account: &str,
    ) -> Result<Option<CancelRelease>, CancelError> {
        let order = self
            .orders
            .get(order_id)
            .ok_or_else(|| CancelError::NotFound(order_id.to_string()))?;
        if order.user_address != account {
            return Err(CancelError::NotOwner);
        }

        let Some((side, price)) = self.resting.get(order_id).copied() else {
            return Ok(None);
        };

        let entry = match side {
            Side::Buy => self.bids.remove(price, order_id),
            Side::Sell => self.asks.remove(price, order_id),
        }
        .expect("resting index out of sync with levels");

        self.resting.remove(order_id);
        self.orders
            .get_mut(order_id)
            .expect("order vanished during cancel")
            .cancel();

        Ok(Some(CancelRelease {
            side,
            price,
            remaining: entry.remaining,
        }))
    }

    /// Put an order back in the book at the tail of its price level,
    /// replacing any existing entry (settlement compensation path).
    ///
    /// The order loses its previous queue position; that forfeiture is the
    /// documented cost of a failed settlement. No-op for orders that
    /// cannot rest (no price, nothing remaining).
    pub(crate) fn restore_resting_tail(&mut self, order_id: &str) {
        let Some(order) = self.orders.get(order_id) else {
            return;
        };
        let Some(price) = order.price else {
            return;
        };
        let side = order.side;
        let remaining = order.remaining();
        if !remaining.is_positive() {
            return;
        }

        if let Some((s, p)) = self.resting.get(order_id).copied() {
            match s {
                Side::Buy => self.bids.remove(p, order_id),
                Side::Sell => self.asks.remove(p, order_id),
            };
        }

        let entry = LevelEntry {
            order_id: order_id.to_string(),
            account: order.user_address.clone(),
            sequence: order.sequence,
            remaining,
        };
        match side {
            Side::Buy => self.bids.insert(price, entry),
            Side::Sell => self.asks.insert(price, entry),
        }
        self.resting.insert(order_id.to_string(), (side, price));
    }

    /// Aggregate the top `depth` levels per side.
    pub fn snapshot(&self, depth: usize, timestamp: i64) -> BookSnapshot {
        let to_levels = |raw: Vec<(Price, Quantity, usize)>| {
            raw.into_iter()
                .map(|(price, quantity, order_count)| DepthLevel {
                    price,
                    quantity,
                    order_count,
                })
                .collect()
        };
        BookSnapshot {
            pair: self.pair.clone(),
            bids: to_levels(self.bids.depth_snapshot(depth)),
            asks: to_levels(self.asks.depth_snapshot(depth)),
            timestamp,
        }
    }

    /// Queue quantities must always equal the remaining quantity of the
    /// live orders they index.
    pub fn check_consistency(&self) -> bool {
        let mut resting_sum = Quantity::zero();
        for (order_id, (side, price)) in &self.resting {
            let Some(order) = self.orders.get(order_id) else {
                return false;
            };
            let level = match side {
                Side::Buy => self.bids.level(*price),
                Side::Sell => self.asks.level(*price),
            };
            let Some(entry) = level.and_then(|l| l.iter().find(|e| &e.order_id == order_id)) else {
                return false;
            };
            if entry.remaining != order.remaining() {
                return false;
            }
            resting_sum = resting_sum + order.remaining();
        }
        self.bids.total_quantity() + self.asks.total_quantity() == resting_sum
    }
}

fn scan_levels<'a, I>(
    levels: I,
    side: Side,
    limit: Option<Price>,
    account: &str,
    max_quantity: Quantity,
    stop_at_own: bool,
) -> ScanResult
where
    I: Iterator<Item = (&'a Price, &'a crate::book::price_level::PriceLevel)>,
{
    let mut remaining = max_quantity;
    let mut achievable = Quantity::zero();
    let mut quote_cost = Decimal::ZERO;

    'levels: for (price, level) in levels {
        if !remaining.is_positive() || !crossing::price_allows(side, limit, *price) {
            break;
        }
        for entry in level.iter() {
            if !remaining.is_positive() {
                break;
            }
            if entry.account == account {
                if stop_at_own {
                    break 'levels;
                }
                continue;
            }
            let take = remaining.min(entry.remaining);
            achievable = achievable + take;
            quote_cost += take * *price;
            remaining = remaining.saturating_sub(take);
        }
    }

    ScanResult {
        achievable,
        quote_cost,
    }
}
