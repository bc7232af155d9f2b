//! Order-book snapshot types
//!
//! Returned by the order-book fetch operation. Entries are projections
//! of resting orders (the OrderRecord wire shape), listed best price
//! first on each side.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Projection of a resting order in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookEntry {
    pub id: u64,
    pub ts: i64,
    pub price: Decimal,
    pub remaining: Decimal,
}

/// Point-in-time view of up to N resting orders per side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub symbol: String,
    pub ts: i64,
    /// Best bid first (price descending, then time ascending)
    pub bids: Vec<BookEntry>,
    /// Best ask first (price ascending, then time ascending)
    pub asks: Vec<BookEntry>,
}

impl BookSnapshot {
    pub fn empty(symbol: impl Into<String>, ts: i64) -> Self {
        Self {
            symbol: symbol.into(),
            ts,
            bids: Vec::new(),
            asks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}
