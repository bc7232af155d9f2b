//! Persisted replay offset
//!
//! One 8-byte big-endian value — the byte offset of the next unreplayed
//! record — stored in the log's sibling `.metadata` file using the same
//! atomic-file mechanism as the log itself. An absent or empty file
//! reads as offset 0.

use crate::atomic::{AtomicFile, LogError};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Extension appended to a log path to form its metadata sibling
pub const METADATA_SUFFIX: &str = ".metadata";

/// Durable store for a single replay offset
pub struct OffsetStore {
    file: AtomicFile,
}

impl OffsetStore {
    /// Open the metadata file at `path`, recovering it if needed.
    pub fn open(path: impl Into<PathBuf>, write_timeout: Duration) -> Result<Self, LogError> {
        Ok(Self {
            file: AtomicFile::open(path, write_timeout)?,
        })
    }

    /// Metadata path for a given log path (`<log>.metadata`)
    pub fn sibling_path(log_path: &Path) -> PathBuf {
        let mut os = log_path.as_os_str().to_os_string();
        os.push(METADATA_SUFFIX);
        PathBuf::from(os)
    }

    /// Read the stored offset; 0 if nothing has been persisted yet.
    pub fn load(&self) -> Result<u64, LogError> {
        if self.file.durable_size() < 8 {
            return Ok(0);
        }
        let bytes = self.file.read_at(0, 8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes);
        Ok(u64::from_be_bytes(buf))
    }

    /// Durably persist a new offset.
    pub async fn store(&self, offset: u64) -> Result<(), LogError> {
        self.file.overwrite(&offset.to_be_bytes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TIMEOUT: Duration = Duration::from_millis(500);

    #[tokio::test]
    async fn test_absent_offset_reads_zero() {
        let tmp = TempDir::new().unwrap();
        let store = OffsetStore::open(tmp.path().join("BTC|USDT.events.metadata"), TIMEOUT).unwrap();
        assert_eq!(store.load().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_store_and_load() {
        let tmp = TempDir::new().unwrap();
        let store = OffsetStore::open(tmp.path().join("BTC|USDT.events.metadata"), TIMEOUT).unwrap();

        store.store(1234).await.unwrap();
        assert_eq!(store.load().unwrap(), 1234);
        store.store(5678).await.unwrap();
        assert_eq!(store.load().unwrap(), 5678);
    }

    #[tokio::test]
    async fn test_offset_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("BTC|USDT.events.metadata");
        {
            let store = OffsetStore::open(&path, TIMEOUT).unwrap();
            store.store(99).await.unwrap();
        }
        let store = OffsetStore::open(&path, TIMEOUT).unwrap();
        assert_eq!(store.load().unwrap(), 99);
    }

    #[test]
    fn test_sibling_path() {
        let path = OffsetStore::sibling_path(Path::new("/data/BTC|USDT.events"));
        assert_eq!(path, PathBuf::from("/data/BTC|USDT.events.metadata"));
    }
}
