//! Trade execution types
//!
//! A trade records both sides' quoted limit prices verbatim — no single
//! execution price is computed. The `metadata` field carries the two
//! orders' post-trade remaining quantities so log replay can update
//! both sides without re-deriving them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An executed match between one buy and one sell order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub buy_order_id: u64,
    pub sell_order_id: u64,
    pub symbol: String,
    /// Matched quantity: `min(buy.remaining, sell.remaining)` at match time
    pub quantity: Decimal,
    /// Buy order's quoted price ("0" for market buys)
    pub buy_price: Decimal,
    /// Sell order's quoted price ("0" for market sells)
    pub sell_price: Decimal,
    /// Post-trade remainings, `"bor:<buy>;sor:<sell>"`
    pub metadata: String,
    /// Unix nanosecond execution timestamp
    pub ts: i64,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        buy_order_id: u64,
        sell_order_id: u64,
        symbol: impl Into<String>,
        quantity: Decimal,
        buy_price: Decimal,
        sell_price: Decimal,
        buy_remaining: Decimal,
        sell_remaining: Decimal,
        ts: i64,
    ) -> Self {
        Self {
            buy_order_id,
            sell_order_id,
            symbol: symbol.into(),
            quantity,
            buy_price,
            sell_price,
            metadata: Self::fill_metadata(buy_remaining, sell_remaining),
            ts,
        }
    }

    /// Encode post-trade remainings as `"bor:<x>;sor:<y>"`
    pub fn fill_metadata(buy_remaining: Decimal, sell_remaining: Decimal) -> String {
        format!("bor:{};sor:{}", buy_remaining, sell_remaining)
    }

    /// Parse the metadata back into `(buy_remaining, sell_remaining)`
    pub fn remainders(&self) -> Option<(Decimal, Decimal)> {
        let (bor, sor) = self.metadata.split_once(';')?;
        let bor = bor.strip_prefix("bor:")?.parse().ok()?;
        let sor = sor.strip_prefix("sor:")?.parse().ok()?;
        Some((bor, sor))
    }
}
