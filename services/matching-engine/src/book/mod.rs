//! Two-sided per-symbol order book
//!
//! Price-time priority on both sides: bids by price descending, asks by
//! price ascending, earliest timestamp first within a price. Snapshots
//! are non-destructive reads; the book is only ever mutated by its
//! engine's worker.

pub mod price_level;
pub mod side;

pub use price_level::PriceLevel;
pub use side::BookSide;

use rust_decimal::Decimal;
use types::prelude::*;

/// What a cancellation did to the book, so a failed durable append can
/// be compensated exactly
#[derive(Debug, PartialEq)]
pub enum CancelOutcome {
    /// No resting `(id, symbol)` match, or the requested quantity
    /// exceeded the order's remaining. The book is untouched.
    NotFound,
    /// Full cancel: the order was removed
    Removed(Order),
    /// Partial cancel: `amount` was subtracted from the order's
    /// remaining; its queue position is unchanged
    Reduced { id: u64, amount: Decimal },
}

/// One symbol's resting orders
#[derive(Debug)]
pub struct SymbolBook {
    symbol: String,
    bids: BookSide,
    asks: BookSide,
}

impl SymbolBook {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Rest an order on its side. Returns false on a duplicate id.
    pub fn offer(&mut self, order: Order) -> bool {
        match order.side() {
            Side::Buy => self.bids.insert(order),
            Side::Sell => self.asks.insert(order),
        }
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.best_price()
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.best_price()
    }

    /// True while the best bid is willing to pay the best ask
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid >= ask,
            _ => false,
        }
    }

    /// Highest-priority resting order on one side
    pub fn front(&self, side: Side) -> Option<&Order> {
        self.side(side).front()
    }

    pub fn front_mut(&mut self, side: Side) -> Option<&mut Order> {
        self.side_mut(side).front_mut()
    }

    /// Both tops at once, for trading them against each other
    pub fn best_pair_mut(&mut self) -> Option<(&mut Order, &mut Order)> {
        let buy = self.bids.front_mut()?;
        let sell = self.asks.front_mut()?;
        Some((buy, sell))
    }

    /// Evict any top order that has reached zero remaining.
    pub fn drop_filled_front(&mut self, side: Side) {
        self.side_mut(side).drop_front_if_filled();
    }

    /// Apply a cancellation.
    ///
    /// Scans resting buys, then sells, for the id. Zero quantity or
    /// quantity equal to remaining removes the order; less reduces it
    /// in place; more than remaining is reported as not-found without
    /// mutating anything (a cancel racing a fill silently no-ops).
    pub fn cancel(&mut self, cancel: &CancelOrder) -> CancelOutcome {
        for side in [Side::Buy, Side::Sell] {
            let Some(resting) = self.side_mut(side).find_mut(cancel.id) else {
                continue;
            };
            if cancel.is_full_cancel() || resting.remaining == cancel.quantity {
                let removed = self
                    .side_mut(side)
                    .remove(cancel.id)
                    .map(CancelOutcome::Removed);
                return removed.unwrap_or(CancelOutcome::NotFound);
            }
            if resting.remaining > cancel.quantity {
                resting.remaining -= cancel.quantity;
                return CancelOutcome::Reduced {
                    id: cancel.id,
                    amount: cancel.quantity,
                };
            }
            // remaining < requested quantity
            return CancelOutcome::NotFound;
        }
        CancelOutcome::NotFound
    }

    /// Undo a partial cancel after a failed durable append.
    pub fn restore_remaining(&mut self, id: u64, amount: Decimal) {
        for side in [Side::Buy, Side::Sell] {
            if let Some(resting) = self.side_mut(side).find_mut(id) {
                resting.remaining += amount;
                return;
            }
        }
    }

    /// Up to `depth` resting orders per side, best first, without
    /// touching the book's structure or tie ordering.
    pub fn snapshot(&self, depth: usize, ts: i64) -> BookSnapshot {
        let project = |order: &Order| BookEntry {
            id: order.id,
            ts: order.ts,
            price: order.price,
            remaining: order.remaining,
        };
        BookSnapshot {
            symbol: self.symbol.clone(),
            ts,
            bids: self.bids.iter_priority().take(depth).map(project).collect(),
            asks: self.asks.iter_priority().take(depth).map(project).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn limit(id: u64, ts: i64, side: Side, qty: &str, price: &str) -> Order {
        Order::limit(
            id,
            ts,
            "BTC|USDT",
            side,
            dec(qty),
            dec(price),
            TimeInForce::Gtc,
        )
    }

    #[test]
    fn test_crossed_detection() {
        let mut book = SymbolBook::new("BTC|USDT");
        assert!(!book.is_crossed());

        book.offer(limit(1, 10, Side::Sell, "1", "100"));
        book.offer(limit(2, 20, Side::Buy, "1", "99"));
        assert!(!book.is_crossed());

        book.offer(limit(3, 30, Side::Buy, "1", "100"));
        assert!(book.is_crossed());
    }

    #[test]
    fn test_full_cancel_removes_order() {
        let mut book = SymbolBook::new("BTC|USDT");
        book.offer(limit(1, 10, Side::Buy, "1", "100"));

        let outcome = book.cancel(&CancelOrder::all(1, 20, "BTC|USDT"));
        assert!(matches!(outcome, CancelOutcome::Removed(o) if o.id == 1));
        assert!(book.is_empty());
    }

    #[test]
    fn test_cancel_exact_remaining_removes_order() {
        let mut book = SymbolBook::new("BTC|USDT");
        book.offer(limit(1, 10, Side::Sell, "2", "100"));

        let outcome = book.cancel(&CancelOrder::new(1, 20, "BTC|USDT", dec("2")));
        assert!(matches!(outcome, CancelOutcome::Removed(_)));
        assert!(book.is_empty());
    }

    #[test]
    fn test_partial_cancel_keeps_queue_position() {
        let mut book = SymbolBook::new("BTC|USDT");
        book.offer(limit(1, 10, Side::Sell, "2", "100"));
        book.offer(limit(2, 20, Side::Sell, "1", "100"));

        let outcome = book.cancel(&CancelOrder::new(1, 30, "BTC|USDT", dec("0.5")));
        assert_eq!(
            outcome,
            CancelOutcome::Reduced {
                id: 1,
                amount: dec("0.5")
            }
        );
        // Still first at its price
        let front = book.front(Side::Sell).unwrap();
        assert_eq!(front.id, 1);
        assert_eq!(front.remaining, dec("1.5"));
    }

    #[test]
    fn test_cancel_more_than_remaining_is_not_found() {
        let mut book = SymbolBook::new("BTC|USDT");
        book.offer(limit(1, 10, Side::Buy, "1", "100"));

        let outcome = book.cancel(&CancelOrder::new(1, 20, "BTC|USDT", dec("5")));
        assert_eq!(outcome, CancelOutcome::NotFound);
        assert_eq!(book.front(Side::Buy).unwrap().remaining, dec("1"));
    }

    #[test]
    fn test_cancel_unknown_id_is_not_found() {
        let mut book = SymbolBook::new("BTC|USDT");
        assert_eq!(
            book.cancel(&CancelOrder::all(9, 1, "BTC|USDT")),
            CancelOutcome::NotFound
        );
    }

    #[test]
    fn test_restore_remaining_undoes_partial_cancel() {
        let mut book = SymbolBook::new("BTC|USDT");
        book.offer(limit(1, 10, Side::Buy, "2", "100"));
        book.cancel(&CancelOrder::new(1, 20, "BTC|USDT", dec("0.5")));

        book.restore_remaining(1, dec("0.5"));
        assert_eq!(book.front(Side::Buy).unwrap().remaining, dec("2"));
    }

    #[test]
    fn test_snapshot_depth_two_of_three_asks() {
        let mut book = SymbolBook::new("BTC|USDT");
        book.offer(limit(4, 10, Side::Sell, "1", "100"));
        book.offer(limit(5, 20, Side::Sell, "1", "101"));
        book.offer(limit(6, 30, Side::Sell, "1", "102"));

        let snap = book.snapshot(2, 99);
        let ids: Vec<u64> = snap.asks.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![4, 5]);

        let full = book.snapshot(3, 99);
        let ids: Vec<u64> = full.asks.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![4, 5, 6]);

        // Snapshotting twice leaves tie ordering intact
        assert_eq!(book.snapshot(3, 99).asks, full.asks);
        assert_eq!(book.len(), 3);
    }
}
