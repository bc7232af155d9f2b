//! Per-symbol order matching
//!
//! One engine per symbol owns a two-sided price-time priority book and
//! a handle to that symbol's durable event log. A single worker task
//! serializes every mutation; trades and cancellations are appended to
//! the log before the triggering operation's future resolves. The
//! registry creates engines lazily and pairs each with a log-replay
//! synchronizer; the dispatcher is the framed-payload entry point.

pub mod book;
pub mod context;
pub mod dispatch;
pub mod engine;
pub mod matching;
pub mod registry;

pub use book::{CancelOutcome, SymbolBook};
pub use context::{App, EngineConfig};
pub use dispatch::Dispatcher;
pub use engine::{Engine, EngineError};
pub use matching::ExecutionEvent;
pub use registry::EngineRegistry;
