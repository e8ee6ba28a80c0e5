//! Bid (buy-side) price levels
//!
//! Sorted by price with the highest bid first. BTreeMap keeps iteration
//! deterministic; the walk order is what enforces price priority.

use super::price_level::{LevelEntry, PriceLevel};
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};
use types::numeric::{Price, Quantity};

#[derive(Debug, Clone, Default)]
pub struct BidBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, price: Price, entry: LevelEntry) {
        self.levels.entry(price).or_default().push_back(entry);
    }

    pub fn remove(&mut self, price: Price, order_id: &str) -> Option<LevelEntry> {
        let level = self.levels.get_mut(&price)?;
        let entry = level.remove(order_id)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Some(entry)
    }

    /// Best (highest) bid price.
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next_back().copied()
    }

    /// Next price strictly worse (lower) than `price`.
    pub fn next_price_worse(&self, price: Price) -> Option<Price> {
        self.levels
            .range((Unbounded, Excluded(price)))
            .next_back()
            .map(|(p, _)| *p)
    }

    pub fn level(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    pub fn level_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    pub fn prune_if_empty(&mut self, price: Price) {
        if self.levels.get(&price).is_some_and(|l| l.is_empty()) {
            self.levels.remove(&price);
        }
    }

    /// Best-first iteration over levels.
    pub fn levels_best_first(&self) -> impl Iterator<Item = (&Price, &PriceLevel)> {
        self.levels.iter().rev()
    }

    /// Top-N aggregated levels: (price, total quantity, order count).
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, Quantity, usize)> {
        self.levels
            .iter()
            .rev()
            .take(depth)
            .map(|(price, level)| (*price, level.total_quantity(), level.len()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Sum of remaining quantity across all levels (consistency checks).
    pub fn total_quantity(&self) -> Quantity {
        self.levels
            .values()
            .fold(Quantity::zero(), |acc, l| acc + l.total_quantity())
    }
}
