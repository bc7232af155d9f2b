//! Binary record codec shared by the wire protocol and the durable log
//!
//! # Envelope (per record)
//! ```text
//! [version:     u8]        // currently 1
//! [flags:       u8]        // bit 0 = payload compressed
//! [record_type: i32 BE]
//! [payload_len: u32 BE]
//! [payload:     bytes]
//! ```
//!
//! Payloads are flat field sequences with no self-describing schema;
//! decoders read fields in the exact order the writers emit them,
//! keyed by the record-type id in the envelope.

pub mod buffer;
pub mod compress;

use thiserror::Error;
use types::prelude::*;

pub use buffer::{ByteReader, ByteWriter};
pub use compress::{decompress, Compression, FLAG_COMPRESSED};

/// Current envelope version
pub const VERSION: u8 = 1;

/// Fixed envelope size in bytes
pub const ENVELOPE_LEN: usize = 10;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("format invalid: {0}")]
    FormatInvalid(String),

    #[error("unsupported version: {0}")]
    VersionUnsupported(u8),

    #[error("size invalid: declared {declared} bytes, buffer has {actual}")]
    SizeInvalid { declared: usize, actual: usize },

    #[error("unknown record type: {0}")]
    UnknownRecordType(i32),

    #[error("message too big: {size} bytes exceeds limit {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("compression error: {0}")]
    Compression(String),
}

// ── Record Types ────────────────────────────────────────────────────

/// Stable wire/log record-type ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum RecordType {
    FileHeader = 1,
    ErrorMessage = -1,
    BuyLimitOrder = 101,
    SellLimitOrder = 102,
    Trade = 103,
    CancelOrder = 104,
    FetchOrderBook = 105,
    OrderBook = 106,
    BuyMarketOrder = 107,
    SellMarketOrder = 108,
    OrderRecord = 120,
}

impl RecordType {
    pub fn wire_id(&self) -> i32 {
        *self as i32
    }

    pub fn from_wire_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(RecordType::FileHeader),
            -1 => Some(RecordType::ErrorMessage),
            101 => Some(RecordType::BuyLimitOrder),
            102 => Some(RecordType::SellLimitOrder),
            103 => Some(RecordType::Trade),
            104 => Some(RecordType::CancelOrder),
            105 => Some(RecordType::FetchOrderBook),
            106 => Some(RecordType::OrderBook),
            107 => Some(RecordType::BuyMarketOrder),
            108 => Some(RecordType::SellMarketOrder),
            120 => Some(RecordType::OrderRecord),
            _ => None,
        }
    }

    /// Record type carrying the given order kind
    pub fn for_order_kind(kind: OrderKind) -> Self {
        match kind {
            OrderKind::BuyLimit => RecordType::BuyLimitOrder,
            OrderKind::SellLimit => RecordType::SellLimitOrder,
            OrderKind::BuyMarket => RecordType::BuyMarketOrder,
            OrderKind::SellMarket => RecordType::SellMarketOrder,
        }
    }
}

// ── Records ─────────────────────────────────────────────────────────

/// Order-book fetch request (record id 105)
#[derive(Debug, Clone, PartialEq)]
pub struct FetchBook {
    pub ts: i64,
    pub symbol: String,
    /// Maximum resting orders returned per side
    pub depth: u32,
}

/// Every record the codec can carry
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// First record of every durable-log file; payload is the
    /// durability size used for crash recovery only
    FileHeader { durable_size: u64 },
    Error(ErrorMessage),
    Order(Order),
    Trade(Trade),
    Cancel(CancelOrder),
    FetchBook(FetchBook),
    Book(BookSnapshot),
}

impl Record {
    pub fn record_type(&self) -> RecordType {
        match self {
            Record::FileHeader { .. } => RecordType::FileHeader,
            Record::Error(_) => RecordType::ErrorMessage,
            Record::Order(order) => RecordType::for_order_kind(order.kind),
            Record::Trade(_) => RecordType::Trade,
            Record::Cancel(_) => RecordType::CancelOrder,
            Record::FetchBook(_) => RecordType::FetchOrderBook,
            Record::Book(_) => RecordType::OrderBook,
        }
    }
}

// ── Encode ──────────────────────────────────────────────────────────

/// Encode a record: envelope header, then the type-specific payload
pub fn encode(record: &Record, compression: Compression) -> Result<Vec<u8>, CodecError> {
    let mut payload = ByteWriter::with_capacity(64);
    write_payload(record, &mut payload);

    let (payload, flags) = compression.compress(payload.into_bytes())?;

    let mut out = ByteWriter::with_capacity(ENVELOPE_LEN + payload.len());
    out.put_u8(VERSION);
    out.put_u8(flags);
    out.put_i32(record.record_type().wire_id());
    out.put_u32(payload.len() as u32);
    out.put_bytes(&payload);
    Ok(out.into_bytes())
}

fn write_payload(record: &Record, w: &mut ByteWriter) {
    match record {
        Record::FileHeader { durable_size } => {
            w.put_u64(*durable_size);
        }
        Record::Error(err) => {
            w.put_u32(err.code.wire_id());
            w.put_string(&err.message);
        }
        Record::Order(order) => {
            w.put_u64(order.id);
            w.put_i64(order.ts);
            w.put_string(&order.symbol);
            w.put_decimal(&order.quantity);
            w.put_decimal(&order.remaining);
            // Market orders carry neither a price nor a time-in-force
            if order.kind.is_limit() {
                w.put_decimal(&order.price);
                w.put_u8(order.time_in_force.wire_id());
            }
        }
        Record::Trade(trade) => {
            w.put_u64(trade.buy_order_id);
            w.put_u64(trade.sell_order_id);
            w.put_string(&trade.symbol);
            w.put_decimal(&trade.quantity);
            w.put_decimal(&trade.buy_price);
            w.put_decimal(&trade.sell_price);
            w.put_string(&trade.metadata);
            w.put_i64(trade.ts);
        }
        Record::Cancel(cancel) => {
            w.put_u64(cancel.id);
            w.put_i64(cancel.ts);
            w.put_string(&cancel.symbol);
            w.put_decimal(&cancel.quantity);
        }
        Record::FetchBook(fetch) => {
            w.put_i64(fetch.ts);
            w.put_string(&fetch.symbol);
            w.put_u32(fetch.depth);
        }
        Record::Book(book) => {
            w.put_i64(book.ts);
            w.put_string(&book.symbol);
            w.put_u32(book.bids.len() as u32);
            for entry in &book.bids {
                write_book_entry(entry, w);
            }
            w.put_u32(book.asks.len() as u32);
            for entry in &book.asks {
                write_book_entry(entry, w);
            }
        }
    }
}

fn write_book_entry(entry: &BookEntry, w: &mut ByteWriter) {
    w.put_u64(entry.id);
    w.put_i64(entry.ts);
    w.put_decimal(&entry.price);
    w.put_decimal(&entry.remaining);
}

// ── Decode ──────────────────────────────────────────────────────────

/// Decode one complete record buffer (envelope + payload)
pub fn decode(buf: &[u8]) -> Result<Record, CodecError> {
    let (record_type, payload) = decode_envelope(buf)?;
    decode_payload(record_type, &payload)
}

/// Split and validate the envelope, returning the (decompressed) payload
pub fn decode_envelope(buf: &[u8]) -> Result<(RecordType, Vec<u8>), CodecError> {
    if buf.len() < ENVELOPE_LEN {
        return Err(CodecError::FormatInvalid(format!(
            "buffer shorter than envelope: {} < {}",
            buf.len(),
            ENVELOPE_LEN
        )));
    }

    let version = buf[0];
    if version != VERSION {
        return Err(CodecError::VersionUnsupported(version));
    }
    let flags = buf[1];

    let mut type_bytes = [0u8; 4];
    type_bytes.copy_from_slice(&buf[2..6]);
    let type_id = i32::from_be_bytes(type_bytes);
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&buf[6..10]);
    let declared = u32::from_be_bytes(len_bytes) as usize;
    let actual = buf.len() - ENVELOPE_LEN;
    if declared != actual {
        return Err(CodecError::SizeInvalid { declared, actual });
    }

    let record_type =
        RecordType::from_wire_id(type_id).ok_or(CodecError::UnknownRecordType(type_id))?;
    let payload = decompress(flags, &buf[ENVELOPE_LEN..])?;
    Ok((record_type, payload))
}

fn decode_payload(record_type: RecordType, payload: &[u8]) -> Result<Record, CodecError> {
    let mut r = ByteReader::new(payload);
    let record = match record_type {
        RecordType::FileHeader => Record::FileHeader {
            durable_size: r.get_u64()?,
        },
        RecordType::ErrorMessage => {
            let code_id = r.get_u32()?;
            let code = ErrorCode::from_wire_id(code_id).ok_or_else(|| {
                CodecError::FormatInvalid(format!("unknown error code: {}", code_id))
            })?;
            let message = r.get_string()?;
            Record::Error(ErrorMessage::new(code, message))
        }
        RecordType::BuyLimitOrder => Record::Order(read_limit_order(&mut r, Side::Buy)?),
        RecordType::SellLimitOrder => Record::Order(read_limit_order(&mut r, Side::Sell)?),
        RecordType::BuyMarketOrder => Record::Order(read_market_order(&mut r, Side::Buy)?),
        RecordType::SellMarketOrder => Record::Order(read_market_order(&mut r, Side::Sell)?),
        RecordType::Trade => {
            let buy_order_id = r.get_u64()?;
            let sell_order_id = r.get_u64()?;
            let symbol = r.get_string()?;
            let quantity = r.get_decimal()?;
            let buy_price = r.get_decimal()?;
            let sell_price = r.get_decimal()?;
            let metadata = r.get_string()?;
            let ts = r.get_i64()?;
            Record::Trade(Trade {
                buy_order_id,
                sell_order_id,
                symbol,
                quantity,
                buy_price,
                sell_price,
                metadata,
                ts,
            })
        }
        RecordType::CancelOrder => {
            let id = r.get_u64()?;
            let ts = r.get_i64()?;
            let symbol = r.get_string()?;
            let quantity = r.get_decimal()?;
            Record::Cancel(CancelOrder::new(id, ts, symbol, quantity))
        }
        RecordType::FetchOrderBook => {
            let ts = r.get_i64()?;
            let symbol = r.get_string()?;
            let depth = r.get_u32()?;
            Record::FetchBook(FetchBook { ts, symbol, depth })
        }
        RecordType::OrderBook => {
            let ts = r.get_i64()?;
            let symbol = r.get_string()?;
            let bids = read_book_entries(&mut r)?;
            let asks = read_book_entries(&mut r)?;
            Record::Book(BookSnapshot {
                symbol,
                ts,
                bids,
                asks,
            })
        }
        // Book entries only ever appear embedded in an OrderBook response
        RecordType::OrderRecord => {
            return Err(CodecError::FormatInvalid(
                "OrderRecord is not a standalone record".into(),
            ))
        }
    };

    if r.remaining() != 0 {
        return Err(CodecError::FormatInvalid(format!(
            "{} trailing bytes after payload",
            r.remaining()
        )));
    }
    Ok(record)
}

fn read_limit_order(r: &mut ByteReader<'_>, side: Side) -> Result<Order, CodecError> {
    let id = r.get_u64()?;
    let ts = r.get_i64()?;
    let symbol = r.get_string()?;
    let quantity = r.get_decimal()?;
    let remaining = r.get_decimal()?;
    let price = r.get_decimal()?;
    let tif_id = r.get_u8()?;
    let time_in_force = TimeInForce::from_wire_id(tif_id)
        .ok_or_else(|| CodecError::FormatInvalid(format!("unknown time-in-force: {}", tif_id)))?;

    let mut order = Order::limit(id, ts, symbol, side, quantity, price, time_in_force);
    order.remaining = remaining;
    Ok(order)
}

fn read_market_order(r: &mut ByteReader<'_>, side: Side) -> Result<Order, CodecError> {
    let id = r.get_u64()?;
    let ts = r.get_i64()?;
    let symbol = r.get_string()?;
    let quantity = r.get_decimal()?;
    let remaining = r.get_decimal()?;

    let mut order = Order::market(id, ts, symbol, side, quantity);
    order.remaining = remaining;
    Ok(order)
}

fn read_book_entries(r: &mut ByteReader<'_>) -> Result<Vec<BookEntry>, CodecError> {
    let count = r.get_u32()? as usize;
    let mut entries = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        entries.push(BookEntry {
            id: r.get_u64()?,
            ts: r.get_i64()?,
            price: r.get_decimal()?,
            remaining: r.get_decimal()?,
        });
    }
    Ok(entries)
}

// ── Tests ───────────────────────────────────────────────────────────
