//! Market-order matcher
//!
//! Consumes the opposite side best-first at any price. A market order
//! never rests: whatever cannot fill when the opposite side runs dry is
//! dropped silently, with no cancellation record.

use crate::book::SymbolBook;
use crate::matching::{fill_against, ExecutionEvent};

use types::prelude::*;

/// Match an incoming market order until filled or the opposite side is
/// empty. The order's own price side is recorded as `0` on every trade.
pub fn run(book: &mut SymbolBook, order: &mut Order) -> Vec<ExecutionEvent> {
    let mut events = Vec::new();
    let opposite = order.side().opposite();

    while !order.is_filled() {
        let Some(resting) = book.front_mut(opposite) else {
            break;
        };
        let trade = fill_against(order, resting);
        book.drop_filled_front(opposite);
        events.push(ExecutionEvent::Trade(trade));
    }
    events
}
