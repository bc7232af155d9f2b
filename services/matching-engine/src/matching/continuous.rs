//! Continuous resting matcher
//!
//! Trades the best bid against the best ask for as long as they cross.
//! The engine worker runs it to quiescence after every offer or cancel,
//! so match attempts happen promptly without a busy loop.

use crate::book::SymbolBook;
use crate::matching::{fill_pair, ExecutionEvent};
use types::prelude::*;

/// Match crossed resting orders until the book is no longer crossed.
pub fn run(book: &mut SymbolBook) -> Vec<ExecutionEvent> {
    let mut events = Vec::new();
    while book.is_crossed() {
        let Some((buy, sell)) = book.best_pair_mut() else {
            break;
        };
        let trade = fill_pair(buy, sell);
        book.drop_filled_front(Side::Buy);
        book.drop_filled_front(Side::Sell);
        events.push(ExecutionEvent::Trade(trade));
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

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

    fn trades(events: &[ExecutionEvent]) -> Vec<&Trade> {
        events
            .iter()
            .map(|e| match e {
                ExecutionEvent::Trade(t) => t,
                ExecutionEvent::Cancel(_) => panic!("unexpected cancel"),
            })
            .collect()
    }

    #[test]
    fn test_uncrossed_book_is_quiescent() {
        let mut book = SymbolBook::new("BTC|USDT");
        book.offer(limit(1, 10, Side::Sell, "1", "101"));
        book.offer(limit(2, 20, Side::Buy, "1", "100"));

        assert!(run(&mut book).is_empty());
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn test_equal_quantities_clear_both_sides() {
        let mut book = SymbolBook::new("BTC|USDT");
        book.offer(limit(1, 10, Side::Sell, "1", "100000"));
        book.offer(limit(2, 20, Side::Buy, "1", "100000"));

        let events = run(&mut book);
        let trades = trades(&events);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].buy_order_id, 2);
        assert_eq!(trades[0].sell_order_id, 1);
        assert_eq!(trades[0].metadata, "bor:0;sor:0");
        assert!(book.is_empty());
    }

    #[test]
    fn test_large_buy_sweeps_multiple_asks() {
        let mut book = SymbolBook::new("BTC|USDT");
        book.offer(limit(1, 10, Side::Sell, "1", "99"));
        book.offer(limit(2, 20, Side::Sell, "1", "100"));
        book.offer(limit(3, 30, Side::Sell, "1", "101"));
        book.offer(limit(4, 40, Side::Buy, "2.5", "100"));

        let events = run(&mut book);
        let trades = trades(&events);
        // Sweeps 99 then 100; the 101 ask does not cross
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].sell_order_id, 1);
        assert_eq!(trades[1].sell_order_id, 2);

        // Buy rests with 0.5 left, the 101 ask still rests
        assert_eq!(book.front(Side::Buy).unwrap().remaining, dec("0.5"));
        assert_eq!(book.front(Side::Sell).unwrap().id, 3);
    }

    #[test]
    fn test_price_then_time_priority() {
        let mut book = SymbolBook::new("BTC|USDT");
        book.offer(limit(1, 10, Side::Sell, "1", "100"));
        book.offer(limit(2, 20, Side::Sell, "1", "100"));
        book.offer(limit(3, 30, Side::Sell, "1", "99"));
        book.offer(limit(4, 40, Side::Buy, "3", "100"));

        let events = run(&mut book);
        let order_of_fills: Vec<u64> = trades(&events).iter().map(|t| t.sell_order_id).collect();
        // Better price first, then earlier timestamp at the shared price
        assert_eq!(order_of_fills, vec![3, 1, 2]);
        assert!(book.is_empty());
    }

    #[test]
    fn test_each_trade_zeroes_at_least_one_side() {
        let mut book = SymbolBook::new("BTC|USDT");
        book.offer(limit(1, 10, Side::Sell, "0.7", "100"));
        book.offer(limit(2, 20, Side::Buy, "1", "100"));

        let events = run(&mut book);
        let trades = trades(&events);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].quantity, dec("0.7"));
        assert_eq!(trades[0].metadata, "bor:0.3;sor:0");
        assert_eq!(book.front(Side::Buy).unwrap().remaining, dec("0.3"));
        assert!(book.front(Side::Sell).is_none());
    }
}
