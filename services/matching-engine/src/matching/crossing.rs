//! Price crossing predicates

use rust_decimal::Decimal;
use types::prelude::*;

/// Two resting limit prices cross when the bid covers the ask.
pub fn can_match(bid_price: Decimal, ask_price: Decimal) -> bool {
    bid_price >= ask_price
}

/// Is an incoming limit taker willing to trade at a resting price?
pub fn taker_crosses(side: Side, taker_price: Decimal, resting_price: Decimal) -> bool {
    match side {
        Side::Buy => can_match(taker_price, resting_price),
        Side::Sell => can_match(resting_price, taker_price),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_can_match() {
        assert!(can_match(dec("100"), dec("100")));
        assert!(can_match(dec("101"), dec("100")));
        assert!(!can_match(dec("99"), dec("100")));
    }

    #[test]
    fn test_taker_crosses_by_side() {
        assert!(taker_crosses(Side::Buy, dec("100"), dec("100")));
        assert!(!taker_crosses(Side::Buy, dec("99"), dec("100")));
        assert!(taker_crosses(Side::Sell, dec("100"), dec("100")));
        assert!(!taker_crosses(Side::Sell, dec("101"), dec("100")));
    }
}
