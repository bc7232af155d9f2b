//! Per-symbol engine
//!
//! A cheap-clone handle over a command channel to one dedicated worker
//! task. The worker owns the symbol's book and log handle and processes
//! intake, matching and cancellation strictly in arrival order, so all
//! mutation of one symbol is sequentially consistent. Every operation
//! resolves its caller's future exactly once.
//!
//! Discipline for durability: the book is mutated first, then the
//! resulting events are appended to the log. An append failure on the
//! cancel path undoes the in-memory mutation so the book never reflects
//! state the log does not.

use crate::book::{CancelOutcome, SymbolBook};
use crate::matching::{continuous, immediate, market, ExecutionEvent};
use persistence::{EventLog, LogError, Record};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use types::prelude::*;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("order {id} already resting")]
    DuplicateOrder { id: u64 },

    #[error(transparent)]
    Log(#[from] LogError),

    #[error("engine for {0} is not running")]
    Closed(String),
}

// ── Commands ────────────────────────────────────────────────────────

enum Command {
    Offer(Order, oneshot::Sender<Result<(), EngineError>>),
    Cancel(CancelOrder, oneshot::Sender<Result<bool, EngineError>>),
    FetchBook {
        depth: usize,
        ts: i64,
        reply: oneshot::Sender<BookSnapshot>,
    },
    Shutdown(oneshot::Sender<()>),
}

// ── Handle ──────────────────────────────────────────────────────────

/// Handle to one symbol's worker task
#[derive(Clone)]
pub struct Engine {
    symbol: String,
    tx: mpsc::Sender<Command>,
}

impl Engine {
    /// Start the worker task for a symbol.
    pub fn spawn(symbol: impl Into<String>, log: Arc<EventLog>, capacity: usize) -> Self {
        let symbol = symbol.into();
        let (tx, rx) = mpsc::channel(capacity);
        let worker = Worker {
            symbol: symbol.clone(),
            book: SymbolBook::new(&symbol),
            log,
        };
        tokio::spawn(worker.run(rx));
        tracing::info!(symbol = %symbol, "engine started");
        Self { symbol, tx }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Submit an order. Resolves once the order has been matched or
    /// rested and every resulting event is durably logged.
    pub async fn offer(&self, order: Order) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Offer(order, reply))
            .await
            .map_err(|_| self.closed())?;
        rx.await.map_err(|_| self.closed())?
    }

    /// Cancel a resting order. `Ok(false)` means no resting match.
    pub async fn cancel(&self, cancel: CancelOrder) -> Result<bool, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Cancel(cancel, reply))
            .await
            .map_err(|_| self.closed())?;
        rx.await.map_err(|_| self.closed())?
    }

    /// Snapshot up to `depth` resting orders per side.
    pub async fn fetch_book(&self, depth: usize, ts: i64) -> Result<BookSnapshot, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::FetchBook { depth, ts, reply })
            .await
            .map_err(|_| self.closed())?;
        rx.await.map_err(|_| self.closed())
    }

    /// Stop the worker after it drains the commands already queued.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Shutdown(reply))
            .await
            .map_err(|_| self.closed())?;
        rx.await.map_err(|_| self.closed())
    }

    fn closed(&self) -> EngineError {
        EngineError::Closed(self.symbol.clone())
    }
}

// ── Worker ──────────────────────────────────────────────────────────

struct Worker {
    symbol: String,
    book: SymbolBook,
    log: Arc<EventLog>,
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                Command::Offer(order, reply) => {
                    let _ = reply.send(self.offer(order).await);
                }
                Command::Cancel(cancel, reply) => {
                    let _ = reply.send(self.cancel(cancel).await);
                }
                Command::FetchBook { depth, ts, reply } => {
                    let _ = reply.send(self.book.snapshot(depth, ts));
                }
                Command::Shutdown(reply) => {
                    let _ = reply.send(());
                    break;
                }
            }
        }
        tracing::info!(symbol = %self.symbol, "engine stopped");
    }

    async fn offer(&mut self, mut order: Order) -> Result<(), EngineError> {
        let events = if !order.kind.is_limit() {
            market::run(&mut self.book, &mut order)
        } else {
            match order.time_in_force {
                TimeInForce::Gtc => {
                    let id = order.id;
                    if !self.book.offer(order) {
                        return Err(EngineError::DuplicateOrder { id });
                    }
                    continuous::run(&mut self.book)
                }
                TimeInForce::Ioc => immediate::run_ioc(&mut self.book, &mut order),
                TimeInForce::Fok => immediate::run_fok(&mut self.book, &mut order),
            }
        };
        self.append_events(&events).await
    }

    async fn cancel(&mut self, cancel: CancelOrder) -> Result<bool, EngineError> {
        match self.book.cancel(&cancel) {
            CancelOutcome::NotFound => Ok(false),
            CancelOutcome::Removed(order) => {
                if let Err(e) = self.log.append(&Record::Cancel(cancel)).await {
                    tracing::warn!(
                        symbol = %self.symbol,
                        order_id = order.id,
                        error = %e,
                        "cancel append failed, restoring order"
                    );
                    self.book.offer(order);
                    return Err(e.into());
                }
                Ok(true)
            }
            CancelOutcome::Reduced { id, amount } => {
                if let Err(e) = self.log.append(&Record::Cancel(cancel)).await {
                    tracing::warn!(
                        symbol = %self.symbol,
                        order_id = id,
                        error = %e,
                        "cancel append failed, restoring remaining"
                    );
                    self.book.restore_remaining(id, amount);
                    return Err(e.into());
                }
                Ok(true)
            }
        }
    }

    async fn append_events(&self, events: &[ExecutionEvent]) -> Result<(), EngineError> {
        for event in events {
            let record = match event {
                ExecutionEvent::Trade(trade) => Record::Trade(trade.clone()),
                ExecutionEvent::Cancel(cancel) => Record::Cancel(cancel.clone()),
            };
            self.log.append(&record).await?;
        }
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────
