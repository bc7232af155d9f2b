//! Per-symbol durable event log
//!
//! Layers the record codec over [`AtomicFile`]: appends encode a record
//! and reserve its offset atomically; reads decode one record at a
//! byte offset, bounded by the durability size. Offsets are relative to
//! the end of the file header, so offset 0 is the first record appended.

use crate::atomic::{AtomicFile, LogError};
use crate::codec::{self, Compression, Record, ENVELOPE_LEN};
use std::path::PathBuf;
use std::time::Duration;

/// Append-only record log backing one symbol's engine
pub struct EventLog {
    file: AtomicFile,
    compression: Compression,
}

impl EventLog {
    /// Open (and if necessary recover) the log at `path`.
    pub fn open(
        path: impl Into<PathBuf>,
        write_timeout: Duration,
        compression: Compression,
    ) -> Result<Self, LogError> {
        Ok(Self {
            file: AtomicFile::open(path, write_timeout)?,
            compression,
        })
    }

    /// Append one record, returning the offset it was written at.
    pub async fn append(&self, record: &Record) -> Result<u64, LogError> {
        let bytes = codec::encode(record, self.compression)?;
        self.file.append(&bytes).await
    }

    /// Read the record starting at `offset`.
    ///
    /// Returns `Ok(None)` when no complete record is durable at that
    /// offset yet (nothing new written). On success the second element
    /// is the offset of the next record (`offset + envelope + payload`).
    pub fn read_record_at(&self, offset: u64) -> Result<Option<(Record, u64)>, LogError> {
        let durable = self.file.durable_size();
        if offset + ENVELOPE_LEN as u64 > durable {
            return Ok(None);
        }

        let envelope = self.file.read_at(offset, ENVELOPE_LEN)?;
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&envelope[6..10]);
        let payload_len = u32::from_be_bytes(len_bytes) as u64;
        let total = ENVELOPE_LEN as u64 + payload_len;
        if offset + total > durable {
            return Ok(None);
        }

        let buf = self.file.read_at(offset, total as usize)?;
        let record = codec::decode(&buf)?;
        Ok(Some((record, offset + total)))
    }

    /// Record bytes durably written so far
    pub fn durable_size(&self) -> u64 {
        self.file.durable_size()
    }
}

// ── Tests ───────────────────────────────────────────────────────────
