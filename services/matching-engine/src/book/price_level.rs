//! Single price level
//!
//! FIFO queue of resting orders sharing one price. Arrival order is
//! timestamp order (intake assigns timestamps monotonically), so the
//! queue front is always the time-priority winner at this price.

use rust_decimal::Decimal;
use std::collections::VecDeque;
use types::prelude::*;

/// Resting orders at one price, earliest first
#[derive(Debug, Default)]
pub struct PriceLevel {
    orders: VecDeque<Order>,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a new arrival at the back of the level.
    pub fn push_back(&mut self, order: Order) {
        self.orders.push_back(order);
    }

    /// Time-priority winner at this price
    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    pub fn front_mut(&mut self) -> Option<&mut Order> {
        self.orders.front_mut()
    }

    pub fn pop_front(&mut self) -> Option<Order> {
        self.orders.pop_front()
    }

    /// Remove the order with the given id, keeping everyone else's
    /// queue position.
    pub fn remove(&mut self, id: u64) -> Option<Order> {
        let pos = self.orders.iter().position(|o| o.id == id)?;
        self.orders.remove(pos)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Order> {
        self.orders.iter_mut().find(|o| o.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Sum of remaining quantity across the level
    pub fn total_remaining(&self) -> Decimal {
        self.orders.iter().map(|o| o.remaining).sum()
    }
}
