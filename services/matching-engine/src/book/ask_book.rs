//! Ask (sell-side) price levels
//!
//! Sorted by price with the lowest ask first; the natural BTreeMap order.

use super::price_level::{LevelEntry, PriceLevel};
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};
use types::numeric::{Price, Quantity};

#[derive(Debug, Clone, Default)]
pub struct AskBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
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

    /// Best (lowest) ask price.
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next().copied()
    }

    /// Next price strictly worse (higher) than `price`.
    pub fn next_price_worse(&self, price: Price) -> Option<Price> {
        self.levels
            .range((Excluded(price), Unbounded))
            .next()
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
        self.levels.iter()
    }

    /// Top-N aggregated levels: (price, total quantity, order count).
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, Quantity, usize)> {
        self.levels
            .iter()
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

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, seq: u64, qty: &str) -> LevelEntry {
        LevelEntry {
            order_id: id.to_string(),
            account: "acc".to_string(),
            sequence: seq,
            remaining: qty.parse().unwrap(),
        }
    }

    #[test]
    fn test_best_is_lowest() {
        let mut book = AskBook::new();
        book.insert("102".parse().unwrap(), entry("a", 1, "1"));
        book.insert("100".parse().unwrap(), entry("b", 2, "1"));

        assert_eq!(book.best_price(), Some("100".parse().unwrap()));
    }

    #[test]
    fn test_next_price_ascends() {
        let mut book = AskBook::new();
        for p in ["100", "101", "102"] {
            book.insert(p.parse().unwrap(), entry(p, 1, "1"));
        }

        let best = book.best_price().unwrap();
        assert_eq!(book.next_price_worse(best), Some("101".parse().unwrap()));
        assert_eq!(
            book.next_price_worse("102".parse().unwrap()),
            None
        );
    }

    #[test]
    fn test_depth_snapshot_lowest_first() {
        let mut book = AskBook::new();
        book.insert("101".parse().unwrap(), entry("a", 1, "4"));
        book.insert("100".parse().unwrap(), entry("b", 2, "1"));

        let depth = book.depth_snapshot(10);
        assert_eq!(depth[0].0, "100".parse().unwrap());
        assert_eq!(depth[1].0, "101".parse().unwrap());
    }
}
