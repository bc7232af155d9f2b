//! Framed-payload dispatcher
//!
//! Entry point for complete framed payloads delivered by the network
//! collaborator. Every call produces exactly one encoded response
//! record: a success echo, an OrderBook response, or an ErrorMessage.
//! Malformed input never panics and never kills the connection's
//! processing loop.

use crate::context::App;
use crate::engine::EngineError;
use persistence::codec::FetchBook;
use persistence::{decode, encode, CodecError, Record};
use std::fmt::Display;
use std::sync::Arc;
use types::prelude::*;

pub struct Dispatcher {
    app: Arc<App>,
}

impl Dispatcher {
    pub fn new(app: Arc<App>) -> Self {
        Self { app }
    }

    /// Handle one framed payload and encode the response record.
    pub async fn dispatch(&self, frame: &[u8]) -> Result<Vec<u8>, CodecError> {
        let response = self.handle(frame).await;
        encode(&response, self.app.config.compression)
    }

    async fn handle(&self, frame: &[u8]) -> Record {
        if frame.len() > self.app.config.max_frame_size {
            return error_record(
                ErrorCode::MessageTooBig,
                format!(
                    "frame of {} bytes exceeds limit {}",
                    frame.len(),
                    self.app.config.max_frame_size
                ),
            );
        }
        let record = match decode(frame) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(error = %e, "rejected undecodable frame");
                return decode_error(e);
            }
        };
        match record {
            Record::Order(order) => self.handle_order(order).await,
            Record::Cancel(cancel) => self.handle_cancel(cancel).await,
            Record::FetchBook(fetch) => self.handle_fetch(fetch).await,
            other => error_record(
                ErrorCode::MessageNotSupported,
                format!("record type {:?} is not dispatchable", other.record_type()),
            ),
        }
    }

    async fn handle_order(&self, order: Order) -> Record {
        // Duplicate check against the store before the book sees it
        match self.app.store.insert_order_message(&order).await {
            Ok(true) => {}
            Ok(false) => {
                return error_record(
                    ErrorCode::OrderAlreadyExists,
                    format!("order {} already exists for {}", order.id, order.symbol),
                )
            }
            Err(e) => return internal(e),
        }
        let engine = match self.app.registry.get_or_create(&order.symbol) {
            Ok(engine) => engine,
            Err(e) => return internal(e),
        };
        let echo = Record::Order(order.clone());
        match engine.offer(order).await {
            Ok(()) => echo,
            Err(EngineError::DuplicateOrder { id }) => error_record(
                ErrorCode::OrderAlreadyExists,
                format!("order {id} already resting"),
            ),
            Err(e) => internal(e),
        }
    }

    async fn handle_cancel(&self, cancel: CancelOrder) -> Record {
        let engine = match self.app.registry.get_or_create(&cancel.symbol) {
            Ok(engine) => engine,
            Err(e) => return internal(e),
        };
        let echo = Record::Cancel(cancel.clone());
        match engine.cancel(cancel.clone()).await {
            Ok(true) => echo,
            Ok(false) => error_record(
                ErrorCode::OrderNotFound,
                format!("order {} not found for {}", cancel.id, cancel.symbol),
            ),
            Err(e) => internal(e),
        }
    }

    async fn handle_fetch(&self, fetch: FetchBook) -> Record {
        let engine = match self.app.registry.get_or_create(&fetch.symbol) {
            Ok(engine) => engine,
            Err(e) => return internal(e),
        };
        let depth = (fetch.depth as usize).min(self.app.config.depth_cap);
        match engine.fetch_book(depth, fetch.ts).await {
            Ok(snapshot) => Record::Book(snapshot),
            Err(e) => internal(e),
        }
    }
}

fn error_record(code: ErrorCode, message: String) -> Record {
    Record::Error(ErrorMessage::new(code, message))
}

fn decode_error(e: CodecError) -> Record {
    let code = match &e {
        CodecError::FormatInvalid(_) | CodecError::Compression(_) => ErrorCode::FormatInvalid,
        CodecError::VersionUnsupported(_) => ErrorCode::VersionUnsupported,
        CodecError::SizeInvalid { .. } => ErrorCode::SizeInvalid,
        CodecError::UnknownRecordType(_) => ErrorCode::MessageNotSupported,
        CodecError::TooLarge { .. } => ErrorCode::MessageTooBig,
    };
    error_record(code, e.to_string())
}

fn internal(e: impl Display) -> Record {
    tracing::error!(error = %e, "dispatch failed");
    error_record(ErrorCode::InternalError, e.to_string())
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EngineConfig;
    use persistence::{Compression, MemoryStore, OrderStore};
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn dispatcher(tmp: &TempDir) -> Dispatcher {
        let config = EngineConfig {
            data_dir: tmp.path().to_path_buf(),
            ..EngineConfig::default()
        };
        let store = Arc::new(MemoryStore::new()) as Arc<dyn OrderStore>;
        Dispatcher::new(Arc::new(App::new(config, store)))
    }

    fn frame(record: &Record) -> Vec<u8> {
        encode(record, Compression::None).unwrap()
    }

    fn limit(id: u64, ts: i64, side: Side, qty: &str, price: &str) -> Order {
        Order::limit(
            id,
            ts,
            "BTC|USDT",
            side,
            dec(qty),
            dec(price),
            TimeInForce::Gtc,
        )
    }

    async fn roundtrip(dispatcher: &Dispatcher, record: &Record) -> Record {
        let response = dispatcher.dispatch(&frame(record)).await.unwrap();
        decode(&response).unwrap()
    }

    #[tokio::test]
    async fn test_order_success_echo() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = dispatcher(&tmp);

        let order = Record::Order(limit(1, 10, Side::Buy, "1", "100"));
        assert_eq!(roundtrip(&dispatcher, &order).await, order);
    }

    #[tokio::test]
    async fn test_duplicate_order_rejected() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = dispatcher(&tmp);

        let order = Record::Order(limit(1, 10, Side::Buy, "1", "100"));
        roundtrip(&dispatcher, &order).await;

        match roundtrip(&dispatcher, &order).await {
            Record::Error(err) => assert_eq!(err.code, ErrorCode::OrderAlreadyExists),
            other => panic!("expected error record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancel_echo_and_not_found() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = dispatcher(&tmp);

        roundtrip(
            &dispatcher,
            &Record::Order(limit(1, 10, Side::Buy, "1", "100")),
        )
        .await;

        let cancel = Record::Cancel(CancelOrder::all(1, 20, "BTC|USDT"));
        assert_eq!(roundtrip(&dispatcher, &cancel).await, cancel);

        match roundtrip(&dispatcher, &cancel).await {
            Record::Error(err) => assert_eq!(err.code, ErrorCode::OrderNotFound),
            other => panic!("expected error record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_book_depth_limit() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = dispatcher(&tmp);

        for (id, price) in [(4, "100"), (5, "101"), (6, "102")] {
            roundtrip(
                &dispatcher,
                &Record::Order(limit(id, id as i64, Side::Sell, "1", price)),
            )
            .await;
        }

        let fetch = Record::FetchBook(FetchBook {
            ts: 99,
            symbol: "BTC|USDT".into(),
            depth: 2,
        });
        match roundtrip(&dispatcher, &fetch).await {
            Record::Book(snapshot) => {
                let ids: Vec<u64> = snapshot.asks.iter().map(|e| e.id).collect();
                assert_eq!(ids, vec![4, 5]);
                assert!(snapshot.bids.is_empty());
            }
            other => panic!("expected book record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_undispatchable_record() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = dispatcher(&tmp);

        let trade = Record::Trade(Trade::new(
            2,
            1,
            "BTC|USDT",
            dec("1"),
            dec("100"),
            dec("100"),
            Decimal::ZERO,
            Decimal::ZERO,
            0,
        ));
        match roundtrip(&dispatcher, &trade).await {
            Record::Error(err) => assert_eq!(err.code, ErrorCode::MessageNotSupported),
            other => panic!("expected error record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_garbage_frame_is_format_invalid() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = dispatcher(&tmp);

        let response = dispatcher.dispatch(&[1, 2, 3]).await.unwrap();
        match decode(&response).unwrap() {
            Record::Error(err) => assert_eq!(err.code, ErrorCode::FormatInvalid),
            other => panic!("expected error record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unsupported_version() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = dispatcher(&tmp);

        let mut bytes = frame(&Record::Order(limit(1, 10, Side::Buy, "1", "100")));
        bytes[0] = 99;
        let response = dispatcher.dispatch(&bytes).await.unwrap();
        match decode(&response).unwrap() {
            Record::Error(err) => assert_eq!(err.code, ErrorCode::VersionUnsupported),
            other => panic!("expected error record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let tmp = TempDir::new().unwrap();
        let config = EngineConfig {
            data_dir: tmp.path().to_path_buf(),
            max_frame_size: 16,
            ..EngineConfig::default()
        };
        let store = Arc::new(MemoryStore::new()) as Arc<dyn OrderStore>;
        let dispatcher = Dispatcher::new(Arc::new(App::new(config, store)));

        let bytes = frame(&Record::Order(limit(1, 10, Side::Buy, "1", "100")));
        assert!(bytes.len() > 16);
        let response = dispatcher.dispatch(&bytes).await.unwrap();
        match decode(&response).unwrap() {
            Record::Error(err) => assert_eq!(err.code, ErrorCode::MessageTooBig),
            other => panic!("expected error record, got {other:?}"),
        }
    }
}
