//! Order cancellation requests

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Request to cancel all or part of a resting order.
///
/// `quantity == 0` means "cancel all remaining"; any other value is the
/// amount to subtract from the target order's remaining quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelOrder {
    /// Id of the order to cancel
    pub id: u64,
    /// Unix nanosecond timestamp of the cancellation
    pub ts: i64,
    pub symbol: String,
    pub quantity: Decimal,
}

impl CancelOrder {
    pub fn new(id: u64, ts: i64, symbol: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            id,
            ts,
            symbol: symbol.into(),
            quantity,
        }
    }

    /// Full cancellation of whatever remains
    pub fn all(id: u64, ts: i64, symbol: impl Into<String>) -> Self {
        Self::new(id, ts, symbol, Decimal::ZERO)
    }

    /// True when the request removes the order entirely
    pub fn is_full_cancel(&self) -> bool {
        self.quantity.is_zero()
    }
}
