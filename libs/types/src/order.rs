//! Order lifecycle types
//!
//! One flat `Order` struct tagged by [`OrderKind`] and [`TimeInForce`]
//! covers every order variant the engine accepts. Matching code
//! dispatches on the tags instead of on a type hierarchy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order variant tag: side plus limit/market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    BuyLimit,
    SellLimit,
    BuyMarket,
    SellMarket,
}

impl OrderKind {
    /// Which side of the book this kind belongs to
    pub fn side(&self) -> Side {
        match self {
            OrderKind::BuyLimit | OrderKind::BuyMarket => Side::Buy,
            OrderKind::SellLimit | OrderKind::SellMarket => Side::Sell,
        }
    }

    /// Limit orders carry a price and a time-in-force; market orders do not
    pub fn is_limit(&self) -> bool {
        matches!(self, OrderKind::BuyLimit | OrderKind::SellLimit)
    }
}

/// Time-in-force policy for limit orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    /// Good-Till-Cancel: rests until filled or explicitly canceled
    Gtc,
    /// Immediate-Or-Cancel: match immediately, cancel the remainder
    Ioc,
    /// Fill-Or-Kill: full match against the best counter-order or cancel
    Fok,
}

impl TimeInForce {
    /// Stable wire id for the one-byte time-in-force field
    pub fn wire_id(&self) -> u8 {
        match self {
            TimeInForce::Gtc => 0,
            TimeInForce::Ioc => 1,
            TimeInForce::Fok => 2,
        }
    }

    /// Decode the one-byte wire id
    pub fn from_wire_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(TimeInForce::Gtc),
            1 => Some(TimeInForce::Ioc),
            2 => Some(TimeInForce::Fok),
            _ => None,
        }
    }
}

/// A single order as it flows through intake, the book and the matchers.
///
/// `remaining` starts equal to `quantity` and only ever decreases; the
/// engine worker that owns the order is the only mutator. An order is
/// removed from the book the instant `remaining` reaches zero — it is
/// never retained at zero.
///
/// Two orders are equal iff `(id, symbol)` match; `id` is unique within
/// a symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    /// Unix nanosecond intake timestamp; also the time-priority key
    pub ts: i64,
    pub symbol: String,
    pub quantity: Decimal,
    pub remaining: Decimal,
    pub kind: OrderKind,
    /// Quoted limit price; zero for market orders
    pub price: Decimal,
    pub time_in_force: TimeInForce,
}

impl Order {
    /// Create a new limit order with full remaining quantity
    pub fn limit(
        id: u64,
        ts: i64,
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        time_in_force: TimeInForce,
    ) -> Self {
        let kind = match side {
            Side::Buy => OrderKind::BuyLimit,
            Side::Sell => OrderKind::SellLimit,
        };
        Self {
            id,
            ts,
            symbol: symbol.into(),
            quantity,
            remaining: quantity,
            kind,
            price,
            time_in_force,
        }
    }

    /// Create a new market order with full remaining quantity
    pub fn market(id: u64, ts: i64, symbol: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        let kind = match side {
            Side::Buy => OrderKind::BuyMarket,
            Side::Sell => OrderKind::SellMarket,
        };
        Self {
            id,
            ts,
            symbol: symbol.into(),
            quantity,
            remaining: quantity,
            kind,
            price: Decimal::ZERO,
            time_in_force: TimeInForce::Gtc,
        }
    }

    pub fn side(&self) -> Side {
        self.kind.side()
    }

    /// Check if the order has been completely filled
    pub fn is_filled(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Quantity invariant: `0 <= remaining <= quantity`
    pub fn check_invariant(&self) -> bool {
        !self.remaining.is_sign_negative() && self.remaining <= self.quantity
    }

    /// Reduce remaining by a fill amount
    ///
    /// # Panics
    /// Panics if the fill would drive remaining negative
    pub fn fill(&mut self, amount: Decimal) {
        assert!(amount <= self.remaining, "Fill would exceed remaining quantity");
        self.remaining -= amount;
    }
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.symbol == other.symbol
    }
}

impl Eq for Order {}

impl Hash for Order {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.symbol.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_kind_side_and_limit() {
        assert_eq!(OrderKind::BuyLimit.side(), Side::Buy);
        assert_eq!(OrderKind::SellMarket.side(), Side::Sell);
        assert!(OrderKind::SellLimit.is_limit());
        assert!(!OrderKind::BuyMarket.is_limit());
    }

    #[test]
    fn test_time_in_force_wire_roundtrip() {
        for tif in [TimeInForce::Gtc, TimeInForce::Ioc, TimeInForce::Fok] {
            assert_eq!(TimeInForce::from_wire_id(tif.wire_id()), Some(tif));
        }
        assert_eq!(TimeInForce::from_wire_id(9), None);
    }

    #[test]
    fn test_limit_order_creation() {
        let order = Order::limit(
            1,
            1_708_123_456_789_000_000,
            "BTC|USDT",
            Side::Buy,
            dec("1.5"),
            dec("100000"),
            TimeInForce::Gtc,
        );
        assert_eq!(order.kind, OrderKind::BuyLimit);
        assert_eq!(order.remaining, order.quantity);
        assert!(order.check_invariant());
        assert!(!order.is_filled());
    }

    #[test]
    fn test_market_order_has_zero_price() {
        let order = Order::market(2, 1, "BTC|USDT", Side::Sell, dec("0.5"));
        assert_eq!(order.kind, OrderKind::SellMarket);
        assert!(order.price.is_zero());
    }

    #[test]
    fn test_fill_reduces_remaining() {
        let mut order = Order::limit(
            1,
            1,
            "BTC|USDT",
            Side::Buy,
            dec("2"),
            dec("100"),
            TimeInForce::Gtc,
        );
        order.fill(dec("0.5"));
        assert_eq!(order.remaining, dec("1.5"));
        order.fill(dec("1.5"));
        assert!(order.is_filled());
        assert!(order.check_invariant());
    }

    #[test]
    #[should_panic(expected = "Fill would exceed remaining quantity")]
    fn test_overfill_panics() {
        let mut order = Order::limit(
            1,
            1,
            "BTC|USDT",
            Side::Buy,
            dec("1"),
            dec("100"),
            TimeInForce::Gtc,
        );
        order.fill(dec("1.5"));
    }

    #[test]
    fn test_equality_is_id_and_symbol() {
        let a = Order::limit(7, 1, "BTC|USDT", Side::Buy, dec("1"), dec("100"), TimeInForce::Gtc);
        let mut b = Order::limit(7, 99, "BTC|USDT", Side::Sell, dec("3"), dec("200"), TimeInForce::Ioc);
        b.fill(dec("1"));
        assert_eq!(a, b);

        let c = Order::limit(7, 1, "ETH|USDT", Side::Buy, dec("1"), dec("100"), TimeInForce::Gtc);
        assert_ne!(a, c);
    }

    #[test]
    fn test_json_serializes_decimals_as_strings() {
        let order = Order::limit(
            1,
            1,
            "BTC|USDT",
            Side::Buy,
            dec("1.00"),
            dec("100000"),
            TimeInForce::Gtc,
        );
        let json = serde_json::to_string(&order).unwrap();
        assert!(json.contains("\"1.00\""));

        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(back.quantity.to_string(), "1.00");
        assert_eq!(back, order);
    }

    #[test]
    fn test_decimal_strings_preserve_scale() {
        let order = Order::limit(
            1,
            1,
            "BTC|USDT",
            Side::Buy,
            dec("1.00"),
            dec("100000"),
            TimeInForce::Gtc,
        );
        assert_eq!(order.quantity.to_string(), "1.00");
        assert_eq!(order.price.to_string(), "100000");
    }
}
