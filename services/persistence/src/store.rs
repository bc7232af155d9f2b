//! Relational-store seam
//!
//! The core requires, but does not implement, a relational backend.
//! [`OrderStore`] is the contract the synchronizer and order intake
//! depend on; [`MemoryStore`] is the in-process implementation used by
//! tests and single-process deployments. A SQL implementation lives
//! outside this crate and must make [`OrderStore::insert_trade`] a
//! single transaction.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use types::prelude::*;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("constraint violation: {0}")]
    Constraint(String),
}

// ── Contract ────────────────────────────────────────────────────────

/// Stored order row: the order plus replay-maintained state
#[derive(Debug, Clone, PartialEq)]
pub struct StoredOrder {
    pub order: Order,
    pub canceled: bool,
}

/// Relational operations the core depends on.
///
/// `insert_trade` is transactional: it inserts the trade row and
/// updates both referenced orders' remaining quantities (taken from the
/// trade's `bor`/`sor` metadata) atomically, or not at all.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert an inbound order message. Returns `false` on an
    /// `(id, symbol)` conflict instead of erroring — the duplicate
    /// check at intake relies on this.
    async fn insert_order_message(&self, order: &Order) -> Result<bool, StoreError>;

    /// Set an order's remaining quantity.
    async fn update_remaining(
        &self,
        id: u64,
        symbol: &str,
        remaining: Decimal,
    ) -> Result<(), StoreError>;

    /// Mark an order canceled.
    async fn mark_canceled(&self, id: u64, symbol: &str) -> Result<(), StoreError>;

    /// Apply a trade transactionally: trade row + both remainings.
    async fn insert_trade(&self, trade: &Trade) -> Result<(), StoreError>;

    /// Look up a stored order row.
    async fn find_order(&self, id: u64, symbol: &str) -> Result<Option<StoredOrder>, StoreError>;
}

// ── In-memory implementation ────────────────────────────────────────

#[derive(Default)]
struct Tables {
    orders: HashMap<(u64, String), StoredOrder>,
    trades: Vec<Trade>,
}

/// In-memory [`OrderStore`]: one mutex guards both tables, so
/// `insert_trade` is atomic the same way a SQL transaction would be.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All applied trades, in apply order (test inspection)
    pub fn trades(&self) -> Vec<Trade> {
        self.inner.lock().unwrap().trades.clone()
    }

    pub fn trade_count(&self) -> usize {
        self.inner.lock().unwrap().trades.len()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order_message(&self, order: &Order) -> Result<bool, StoreError> {
        let mut tables = self.inner.lock().unwrap();
        let key = (order.id, order.symbol.clone());
        if tables.orders.contains_key(&key) {
            return Ok(false);
        }
        tables.orders.insert(
            key,
            StoredOrder {
                order: order.clone(),
                canceled: false,
            },
        );
        Ok(true)
    }

    async fn update_remaining(
        &self,
        id: u64,
        symbol: &str,
        remaining: Decimal,
    ) -> Result<(), StoreError> {
        let mut tables = self.inner.lock().unwrap();
        match tables.orders.get_mut(&(id, symbol.to_string())) {
            Some(stored) => {
                stored.order.remaining = remaining;
                Ok(())
            }
            None => Err(StoreError::Constraint(format!(
                "order ({}, {}) not found",
                id, symbol
            ))),
        }
    }

    async fn mark_canceled(&self, id: u64, symbol: &str) -> Result<(), StoreError> {
        let mut tables = self.inner.lock().unwrap();
        match tables.orders.get_mut(&(id, symbol.to_string())) {
            Some(stored) => {
                stored.canceled = true;
                Ok(())
            }
            None => Err(StoreError::Constraint(format!(
                "order ({}, {}) not found",
                id, symbol
            ))),
        }
    }

    async fn insert_trade(&self, trade: &Trade) -> Result<(), StoreError> {
        let (buy_remaining, sell_remaining) = trade.remainders().ok_or_else(|| {
            StoreError::Constraint(format!("malformed trade metadata: {}", trade.metadata))
        })?;

        // Single guard over both tables stands in for BEGIN/COMMIT.
        let mut tables = self.inner.lock().unwrap();
        if let Some(buy) = tables
            .orders
            .get_mut(&(trade.buy_order_id, trade.symbol.clone()))
        {
            buy.order.remaining = buy_remaining;
        }
        if let Some(sell) = tables
            .orders
            .get_mut(&(trade.sell_order_id, trade.symbol.clone()))
        {
            sell.order.remaining = sell_remaining;
        }
        tables.trades.push(trade.clone());
        Ok(())
    }

    async fn find_order(&self, id: u64, symbol: &str) -> Result<Option<StoredOrder>, StoreError> {
        let tables = self.inner.lock().unwrap();
        Ok(tables.orders.get(&(id, symbol.to_string())).cloned())
    }
}

// ── Tests ───────────────────────────────────────────────────────────
