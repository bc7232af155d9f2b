//! Immediate limit matchers (IOC and FOK)
//!
//! Neither policy ever rests in the book. IOC takes whatever crosses
//! and cancels the leftover; FOK consults only the single best
//! counter-order and either fills in full or cancels everything.

use crate::book::SymbolBook;
use crate::matching::{crossing, fill_against, ExecutionEvent};

use types::prelude::*;

/// Immediate-Or-Cancel: match while the price crosses, then cancel any
/// unfilled remainder with a `quantity=0` cancel-all record.
pub fn run_ioc(book: &mut SymbolBook, order: &mut Order) -> Vec<ExecutionEvent> {
    let mut events = Vec::new();
    let opposite = order.side().opposite();

    while !order.is_filled() {
        let Some(resting) = book.front_mut(opposite) else {
            break;
        };
        if !crossing::taker_crosses(order.side(), order.price, resting.price) {
            break;
        }
        let trade = fill_against(order, resting);
        book.drop_filled_front(opposite);
        events.push(ExecutionEvent::Trade(trade));
    }

    if !order.is_filled() {
        events.push(ExecutionEvent::Cancel(CancelOrder::all(
            order.id,
            order.ts,
            order.symbol.clone(),
        )));
    }
    events
}

/// Fill-Or-Kill: one shot against the single best counter-order only.
/// Fills in full when the price crosses and the best order can cover
/// the whole quantity; otherwise cancels all remaining without trading.
pub fn run_fok(book: &mut SymbolBook, order: &mut Order) -> Vec<ExecutionEvent> {
    let opposite = order.side().opposite();

    if let Some(resting) = book.front_mut(opposite) {
        if crossing::taker_crosses(order.side(), order.price, resting.price)
            && order.remaining <= resting.remaining
        {
            let trade = fill_against(order, resting);
            book.drop_filled_front(opposite);
            return vec![ExecutionEvent::Trade(trade)];
        }
    }
    vec![ExecutionEvent::Cancel(CancelOrder::all(
        order.id,
        order.ts,
        order.symbol.clone(),
    ))]
}
