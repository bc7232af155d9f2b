//! Persistence & Durable Replay Service
//!
//! Provides the binary record codec shared by the wire protocol and the
//! durable log, the atomic-rename event log with crash recovery, the
//! persisted replay offset, the relational-store seam, and the events
//! synchronizer that tails each symbol's log into that store.

pub mod atomic;
pub mod codec;
pub mod log;
pub mod offset;
pub mod store;
pub mod sync;

pub use atomic::{AtomicFile, LogError};
pub use codec::{decode, encode, CodecError, Compression, Record, RecordType};
pub use log::EventLog;
pub use offset::OffsetStore;
pub use store::{MemoryStore, OrderStore, StoreError, StoredOrder};
pub use sync::{EventsSynchronizer, SyncHandle, SyncProgress};
