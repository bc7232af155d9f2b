//! Atomic-rename durable file
//!
//! A file is always in one of two states: `Stable` (present at its
//! source path) or `MidWrite` (renamed to `<source>.write`). Every
//! write renames source → target, writes the payload at the reserved
//! offset, bumps the durability-size header at the start of the file,
//! fsyncs, and renames back. A crash while `MidWrite` leaves only the
//! target on disk; the next open truncates it to the header's
//! durability size and renames it back, so exactly the previously
//! acknowledged bytes survive — never a partial trailing record.
//!
//! Writers are serialized by a single-permit semaphore with a timeout;
//! reads are plain positioned reads against the source file and do not
//! participate in the rename protocol.

use crate::codec::{self, CodecError, Compression, Record, ENVELOPE_LEN};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;

/// On-disk size of the FileHeader record (envelope + u64 payload)
pub const FILE_HEADER_LEN: u64 = (ENVELOPE_LEN + 8) as u64;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("durable write timed out after {0:?}")]
    Timeout(Duration),

    #[error("log writer closed")]
    Closed,

    #[error("log corrupt: {0}")]
    Corrupt(String),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

// ── Atomic File ─────────────────────────────────────────────────────

/// Append-only file with atomic-rename write discipline and a
/// durability-size header used only for crash recovery.
pub struct AtomicFile {
    source: PathBuf,
    target: PathBuf,
    writer: Semaphore,
    write_timeout: Duration,
    /// Payload bytes after the header known to be durably written
    durable_size: AtomicU64,
}

impl AtomicFile {
    /// Open a file at its source path, running crash recovery first.
    ///
    /// Cold start (neither source nor target present) creates a fresh
    /// file holding only the header. An unreadable header or a rename
    /// that cannot be completed is fatal: the caller must refuse to
    /// start rather than run against possibly-corrupt state.
    pub fn open(source: impl Into<PathBuf>, write_timeout: Duration) -> Result<Self, LogError> {
        let source = source.into();
        let target = Self::target_path(&source);

        let durable_size = if source.exists() {
            if target.exists() {
                // A completed rename-back never leaves a target behind;
                // whatever this is, the source is authoritative.
                tracing::warn!(target_path = %target.display(), "removing stray mid-write file");
                fs::remove_file(&target)?;
            }
            Self::read_header(&source)?
        } else if target.exists() {
            let durable = Self::read_header(&target)?;
            let file = OpenOptions::new().write(true).open(&target)?;
            file.set_len(FILE_HEADER_LEN + durable)?;
            file.sync_all()?;
            drop(file);
            fs::rename(&target, &source).map_err(|e| {
                LogError::Corrupt(format!(
                    "recovery rename {} -> {} failed: {}",
                    target.display(),
                    source.display(),
                    e
                ))
            })?;
            tracing::info!(path = %source.display(), durable, "recovered mid-write file");
            durable
        } else {
            if let Some(parent) = source.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = File::create(&source)?;
            file.write_all(&Self::header_bytes(0)?)?;
            file.sync_all()?;
            0
        };

        Ok(Self {
            source,
            target,
            writer: Semaphore::new(1),
            write_timeout,
            durable_size: AtomicU64::new(durable_size),
        })
    }

    /// Payload bytes (after the header) durably written so far
    pub fn durable_size(&self) -> u64 {
        self.durable_size.load(Ordering::Acquire)
    }

    pub fn path(&self) -> &Path {
        &self.source
    }

    /// Append a payload at the next free offset.
    ///
    /// Returns the offset (relative to the end of the header) where the
    /// payload was written. The offset reservation rolls back if the
    /// write fails, so failed appends leave no durable trace.
    pub async fn append(&self, payload: &[u8]) -> Result<u64, LogError> {
        let permit = tokio::time::timeout(self.write_timeout, self.writer.acquire())
            .await
            .map_err(|_| LogError::Timeout(self.write_timeout))?
            .map_err(|_| LogError::Closed)?;

        let offset = self.durable_size.load(Ordering::Acquire);
        self.write_locked(offset, payload, false)?;
        self.durable_size
            .store(offset + payload.len() as u64, Ordering::Release);

        drop(permit);
        Ok(offset)
    }

    /// Replace the entire payload region with the given bytes.
    ///
    /// Used for fixed-size metadata files (e.g. the replay offset).
    pub async fn overwrite(&self, payload: &[u8]) -> Result<(), LogError> {
        let permit = tokio::time::timeout(self.write_timeout, self.writer.acquire())
            .await
            .map_err(|_| LogError::Timeout(self.write_timeout))?
            .map_err(|_| LogError::Closed)?;

        self.write_locked(0, payload, true)?;
        self.durable_size
            .store(payload.len() as u64, Ordering::Release);

        drop(permit);
        Ok(())
    }

    /// Positioned read of `len` bytes at `offset` (relative to the end
    /// of the header) from the stable source file.
    pub fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>, LogError> {
        let mut file = File::open(&self.source)?;
        file.seek(SeekFrom::Start(FILE_HEADER_LEN + offset))?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    // ── Internal ────────────────────────────────────────────────────

    /// The rename dance. Caller must hold the writer permit.
    fn write_locked(&self, offset: u64, payload: &[u8], truncate: bool) -> Result<(), LogError> {
        fs::rename(&self.source, &self.target)?;

        let result = (|| -> Result<(), LogError> {
            let mut file = OpenOptions::new().read(true).write(true).open(&self.target)?;
            file.seek(SeekFrom::Start(FILE_HEADER_LEN + offset))?;
            file.write_all(payload)?;

            let new_durable = offset + payload.len() as u64;
            if truncate {
                file.set_len(FILE_HEADER_LEN + new_durable)?;
            }
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&Self::header_bytes(new_durable)?)?;
            file.sync_all()?;
            Ok(())
        })();

        match result {
            Ok(()) => {
                fs::rename(&self.target, &self.source)?;
                Ok(())
            }
            Err(e) => {
                // Best-effort return to Stable; the durability header
                // was not advanced, so any partial tail is invisible.
                let _ = fs::rename(&self.target, &self.source);
                Err(e)
            }
        }
    }

    fn header_bytes(durable_size: u64) -> Result<Vec<u8>, CodecError> {
        codec::encode(&Record::FileHeader { durable_size }, Compression::None)
    }

    fn read_header(path: &Path) -> Result<u64, LogError> {
        let mut file = File::open(path)
            .map_err(|e| LogError::Corrupt(format!("cannot open {}: {}", path.display(), e)))?;
        let mut buf = vec![0u8; FILE_HEADER_LEN as usize];
        file.read_exact(&mut buf)
            .map_err(|e| LogError::Corrupt(format!("short header in {}: {}", path.display(), e)))?;
        match codec::decode(&buf) {
            Ok(Record::FileHeader { durable_size }) => Ok(durable_size),
            Ok(other) => Err(LogError::Corrupt(format!(
                "expected file header, found {:?}",
                other.record_type()
            ))),
            Err(e) => Err(LogError::Corrupt(format!(
                "invalid header in {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn target_path(source: &Path) -> PathBuf {
        let mut os = source.as_os_str().to_os_string();
        os.push(".write");
        PathBuf::from(os)
    }

    #[cfg(test)]
    pub(crate) async fn hold_writer(&self) -> tokio::sync::SemaphorePermit<'_> {
        self.writer.acquire().await.unwrap()
    }
}

// ── Tests ───────────────────────────────────────────────────────────
