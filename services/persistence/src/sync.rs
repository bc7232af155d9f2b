//! Events synchronizer
//!
//! One loop per symbol tails the durable log and applies each record to
//! the relational store, advancing the persisted replay offset only
//! after a confirmed apply. Every failure is treated as transient and
//! retried from the same un-advanced offset, which yields at-least-once,
//! in-order, non-skipping replay: the relational operations are not
//! required to be idempotent, so correctness rests on the offset never
//! moving past an unconfirmed record.

use crate::atomic::LogError;
use crate::codec::Record;
use crate::log::EventLog;
use crate::offset::OffsetStore;
use crate::store::{OrderStore, StoreError};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use types::prelude::*;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("log error: {0}")]
    Log(#[from] LogError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of a single synchronizer iteration
#[derive(Debug, PartialEq)]
pub enum SyncProgress {
    /// A record was applied and the offset advanced to `next_offset`
    Applied { next_offset: u64 },
    /// Nothing to do: no new durable record at the current offset
    Idle,
}

// ── Synchronizer ────────────────────────────────────────────────────

/// Replays one symbol's durable log into the relational store.
pub struct EventsSynchronizer {
    symbol: String,
    log: Arc<EventLog>,
    offsets: OffsetStore,
    store: Arc<dyn OrderStore>,
    idle_backoff: Duration,
}

impl EventsSynchronizer {
    pub fn new(
        symbol: impl Into<String>,
        log: Arc<EventLog>,
        offsets: OffsetStore,
        store: Arc<dyn OrderStore>,
        idle_backoff: Duration,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            log,
            offsets,
            store,
            idle_backoff,
        }
    }

    /// One iteration: read the record at the persisted offset, apply
    /// it, and persist the advanced offset on success.
    pub async fn poll_once(&self) -> Result<SyncProgress, SyncError> {
        let offset = self.offsets.load()?;
        let Some((record, next_offset)) = self.log.read_record_at(offset)? else {
            return Ok(SyncProgress::Idle);
        };

        match record {
            Record::Trade(trade) => {
                self.store.insert_trade(&trade).await?;
            }
            Record::Cancel(cancel) => {
                self.apply_cancel(&cancel).await?;
            }
            other => {
                // The engine only appends trades and cancellations;
                // anything else is left in place for this iteration.
                tracing::debug!(
                    symbol = %self.symbol,
                    record_type = ?other.record_type(),
                    offset,
                    "skipping non-replayable record"
                );
                return Ok(SyncProgress::Idle);
            }
        }

        self.offsets.store(next_offset).await?;
        Ok(SyncProgress::Applied { next_offset })
    }

    async fn apply_cancel(&self, cancel: &CancelOrder) -> Result<(), SyncError> {
        if cancel.is_full_cancel() {
            self.store.mark_canceled(cancel.id, &cancel.symbol).await?;
            return Ok(());
        }
        match self.store.find_order(cancel.id, &cancel.symbol).await? {
            Some(stored) => {
                let remaining = (stored.order.remaining - cancel.quantity).max(Decimal::ZERO);
                self.store
                    .update_remaining(cancel.id, &cancel.symbol, remaining)
                    .await?;
                Ok(())
            }
            None => Err(SyncError::Store(StoreError::Constraint(format!(
                "cancel target ({}, {}) not stored",
                cancel.id, cancel.symbol
            )))),
        }
    }

    /// Run the loop on a background task until shut down.
    pub fn spawn(self) -> SyncHandle {
        let (shutdown, mut watch_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            loop {
                if *watch_rx.borrow() {
                    break;
                }
                let wait = match self.poll_once().await {
                    Ok(SyncProgress::Applied { .. }) => continue,
                    Ok(SyncProgress::Idle) => self.idle_backoff,
                    Err(e) => {
                        tracing::warn!(
                            symbol = %self.symbol,
                            error = %e,
                            "replay apply failed; retrying from same offset"
                        );
                        self.idle_backoff
                    }
                };
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = watch_rx.changed() => {}
                }
            }
            tracing::debug!(symbol = %self.symbol, "synchronizer stopped");
        });
        SyncHandle { shutdown, handle }
    }
}

/// Handle to a spawned synchronizer loop
pub struct SyncHandle {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SyncHandle {
    /// Signal the loop to stop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

// ── Tests ───────────────────────────────────────────────────────────
