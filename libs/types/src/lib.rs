//! Types library for the order-matching backend
//!
//! This library provides the domain types shared by the matching engine
//! and the persistence layer: orders, trades, cancellations, order-book
//! snapshots and the wire error taxonomy.
//!
//! # Modules
//! - `order`: tagged order variants (limit/market, buy/sell) and time-in-force
//! - `cancel`: cancellation requests
//! - `trade`: executed trades with post-trade remaining metadata
//! - `snapshot`: order-book snapshots returned by fetch operations
//! - `errors`: wire-level error taxonomy

pub mod cancel;
pub mod errors;
pub mod order;
pub mod snapshot;
pub mod trade;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancel::*;
    pub use crate::errors::*;
    pub use crate::order::*;
    pub use crate::snapshot::*;
    pub use crate::trade::*;
}
