//! Matching algorithms
//!
//! Four matchers share one fill primitive: the continuous resting
//! matcher for crossed GTC orders, the market matcher, and the IOC and
//! FOK immediate matchers. Each returns the ordered list of events it
//! produced; the engine appends them to the durable log in that order.

pub mod continuous;
pub mod crossing;
pub mod immediate;
pub mod market;

use types::prelude::*;

/// A matcher output, in the order it must reach the durable log
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    Trade(Trade),
    Cancel(CancelOrder),
}

/// Trade two orders for `min(buy.remaining, sell.remaining)`.
///
/// Both orders are filled in place; the trade preserves each side's
/// quoted price verbatim and carries both post-trade remainings in its
/// metadata. At least one side reaches zero remaining.
pub(crate) fn fill_pair(buy: &mut Order, sell: &mut Order) -> Trade {
    let matched = buy.remaining.min(sell.remaining);
    buy.fill(matched);
    sell.fill(matched);
    Trade::new(
        buy.id,
        sell.id,
        buy.symbol.clone(),
        matched,
        buy.price,
        sell.price,
        buy.remaining,
        sell.remaining,
        buy.ts.max(sell.ts),
    )
}

/// [`fill_pair`] with buy/sell roles assigned from the taker's side.
pub(crate) fn fill_against(taker: &mut Order, resting: &mut Order) -> Trade {
    match taker.side() {
        Side::Buy => fill_pair(taker, resting),
        Side::Sell => fill_pair(resting, taker),
    }
}
