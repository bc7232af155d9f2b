//! One side of the book
//!
//! Price levels keyed in a `BTreeMap`; bids serve the highest price
//! first, asks the lowest. An id set rejects duplicate resting ids.

use crate::book::price_level::PriceLevel;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use types::prelude::*;

/// All resting orders on one side, in price-time priority
#[derive(Debug)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<Decimal, PriceLevel>,
    ids: HashSet<u64>,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
            ids: HashSet::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Rest an order at its price level. Returns false (and drops the
    /// order) if the id is already resting on this side.
    pub fn insert(&mut self, order: Order) -> bool {
        if !self.ids.insert(order.id) {
            return false;
        }
        self.levels.entry(order.price).or_default().push_back(order);
        true
    }

    /// Best price on this side: highest bid, lowest ask
    pub fn best_price(&self) -> Option<Decimal> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    fn best_level_mut(&mut self) -> Option<&mut PriceLevel> {
        match self.side {
            Side::Buy => self.levels.values_mut().next_back(),
            Side::Sell => self.levels.values_mut().next(),
        }
    }

    /// Highest-priority resting order without removal
    pub fn front(&self) -> Option<&Order> {
        let level = match self.side {
            Side::Buy => self.levels.values().next_back(),
            Side::Sell => self.levels.values().next(),
        };
        level.and_then(|l| l.front())
    }

    pub fn front_mut(&mut self) -> Option<&mut Order> {
        self.best_level_mut().and_then(|l| l.front_mut())
    }

    /// Remove and return the highest-priority resting order.
    pub fn pop_front(&mut self) -> Option<Order> {
        let price = self.best_price()?;
        let level = self.levels.get_mut(&price)?;
        let order = level.pop_front()?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        self.ids.remove(&order.id);
        Some(order)
    }

    /// Drop the front order if it has reached zero remaining. Filled
    /// orders are never retained in the book.
    pub fn drop_front_if_filled(&mut self) {
        if self.front().is_some_and(|o| o.is_filled()) {
            self.pop_front();
        }
    }

    /// Remove a specific resting order by id.
    pub fn remove(&mut self, id: u64) -> Option<Order> {
        if !self.ids.remove(&id) {
            return None;
        }
        let mut removed = None;
        let mut emptied_price = None;
        for (price, level) in self.levels.iter_mut() {
            if let Some(order) = level.remove(id) {
                if level.is_empty() {
                    emptied_price = Some(*price);
                }
                removed = Some(order);
                break;
            }
        }
        if let Some(price) = emptied_price {
            self.levels.remove(&price);
        }
        removed
    }

    /// Mutable access to a resting order by id (queue position unchanged)
    pub fn find_mut(&mut self, id: u64) -> Option<&mut Order> {
        if !self.ids.contains(&id) {
            return None;
        }
        self.levels.values_mut().find_map(|level| level.get_mut(id))
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    /// Resting orders in priority order, non-destructive
    pub fn iter_priority(&self) -> Box<dyn Iterator<Item = &Order> + '_> {
        match self.side {
            Side::Buy => Box::new(self.levels.values().rev().flat_map(|l| l.iter())),
            Side::Sell => Box::new(self.levels.values().flat_map(|l| l.iter())),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of distinct price levels
    pub fn depth(&self) -> usize {
        self.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn order(id: u64, ts: i64, side: Side, price: &str) -> Order {
        Order::limit(
            id,
            ts,
            "BTC|USDT",
            side,
            dec("1"),
            dec(price),
            TimeInForce::Gtc,
        )
    }

    #[test]
    fn test_bids_serve_highest_price_first() {
        let mut bids = BookSide::new(Side::Buy);
        bids.insert(order(1, 10, Side::Buy, "99"));
        bids.insert(order(2, 20, Side::Buy, "101"));
        bids.insert(order(3, 30, Side::Buy, "100"));

        assert_eq!(bids.best_price(), Some(dec("101")));
        assert_eq!(bids.pop_front().unwrap().id, 2);
        assert_eq!(bids.pop_front().unwrap().id, 3);
        assert_eq!(bids.pop_front().unwrap().id, 1);
    }

    #[test]
    fn test_asks_serve_lowest_price_first() {
        let mut asks = BookSide::new(Side::Sell);
        asks.insert(order(1, 10, Side::Sell, "101"));
        asks.insert(order(2, 20, Side::Sell, "99"));

        assert_eq!(asks.best_price(), Some(dec("99")));
        assert_eq!(asks.front().unwrap().id, 2);
    }

    #[test]
    fn test_time_priority_within_price() {
        let mut asks = BookSide::new(Side::Sell);
        asks.insert(order(1, 10, Side::Sell, "100"));
        asks.insert(order(2, 20, Side::Sell, "100"));

        assert_eq!(asks.pop_front().unwrap().id, 1);
        assert_eq!(asks.pop_front().unwrap().id, 2);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut asks = BookSide::new(Side::Sell);
        assert!(asks.insert(order(1, 10, Side::Sell, "100")));
        assert!(!asks.insert(order(1, 20, Side::Sell, "101")));
        assert_eq!(asks.len(), 1);
    }

    #[test]
    fn test_remove_clears_empty_level() {
        let mut asks = BookSide::new(Side::Sell);
        asks.insert(order(1, 10, Side::Sell, "100"));
        asks.insert(order(2, 20, Side::Sell, "101"));

        assert!(asks.remove(1).is_some());
        assert_eq!(asks.depth(), 1);
        assert_eq!(asks.best_price(), Some(dec("101")));
        assert!(asks.remove(1).is_none());
    }

    #[test]
    fn test_iter_priority_is_non_destructive() {
        let mut asks = BookSide::new(Side::Sell);
        asks.insert(order(1, 10, Side::Sell, "100"));
        asks.insert(order(2, 20, Side::Sell, "100"));
        asks.insert(order(3, 30, Side::Sell, "99"));

        let ids: Vec<u64> = asks.iter_priority().map(|o| o.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);

        // Unchanged after iteration
        let again: Vec<u64> = asks.iter_priority().map(|o| o.id).collect();
        assert_eq!(again, ids);
        assert_eq!(asks.len(), 3);
    }
}
