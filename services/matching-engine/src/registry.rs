//! Engine registry
//!
//! Symbol to engine map with lazy creation. Opening a symbol wires up
//! its durable log (`<data_dir>/<symbol>.events`), the sibling replay
//! offset file, a synchronizer task and the engine worker. Engines for
//! different symbols share nothing and run fully concurrently.

use crate::context::EngineConfig;
use crate::engine::{Engine, EngineError};
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use persistence::{EventLog, EventsSynchronizer, LogError, OffsetStore, OrderStore, SyncHandle};
use std::sync::Arc;

struct SymbolEntry {
    engine: Engine,
    sync: SyncHandle,
}

/// Lazily-populated symbol → engine map
pub struct EngineRegistry {
    config: EngineConfig,
    store: Arc<dyn OrderStore>,
    engines: DashMap<String, SymbolEntry>,
}

impl EngineRegistry {
    pub fn new(config: EngineConfig, store: Arc<dyn OrderStore>) -> Self {
        Self {
            config,
            store,
            engines: DashMap::new(),
        }
    }

    /// Engine for a symbol, opening its log and tasks on first use.
    ///
    /// Fails with `LogError::Corrupt` wrapped in [`EngineError`] when
    /// the symbol's log cannot be recovered; the symbol then stays
    /// closed rather than running against bad state.
    pub fn get_or_create(&self, symbol: &str) -> Result<Engine, EngineError> {
        match self.engines.entry(symbol.to_string()) {
            MapEntry::Occupied(entry) => Ok(entry.get().engine.clone()),
            MapEntry::Vacant(slot) => {
                let entry = self.open_symbol(symbol)?;
                let engine = entry.engine.clone();
                slot.insert(entry);
                Ok(engine)
            }
        }
    }

    /// Engine for a symbol if it has already been opened
    pub fn get(&self, symbol: &str) -> Option<Engine> {
        self.engines.get(symbol).map(|entry| entry.engine.clone())
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Stop every engine worker and synchronizer.
    pub async fn shutdown(&self) {
        let symbols: Vec<String> = self.engines.iter().map(|e| e.key().clone()).collect();
        for symbol in symbols {
            if let Some((_, entry)) = self.engines.remove(&symbol) {
                let _ = entry.engine.shutdown().await;
                entry.sync.shutdown().await;
                tracing::info!(symbol = %symbol, "symbol closed");
            }
        }
    }

    fn open_symbol(&self, symbol: &str) -> Result<SymbolEntry, EngineError> {
        std::fs::create_dir_all(&self.config.data_dir).map_err(LogError::Io)?;
        let log_path = self.config.data_dir.join(format!("{symbol}.events"));

        let log = Arc::new(EventLog::open(
            &log_path,
            self.config.write_timeout,
            self.config.compression,
        )?);
        let offsets = OffsetStore::open(
            OffsetStore::sibling_path(&log_path),
            self.config.write_timeout,
        )?;
        let sync = EventsSynchronizer::new(
            symbol,
            Arc::clone(&log),
            offsets,
            Arc::clone(&self.store),
            self.config.idle_backoff,
        )
        .spawn();
        let engine = Engine::spawn(symbol, log, self.config.channel_capacity);

        tracing::info!(symbol, path = %log_path.display(), "symbol opened");
        Ok(SymbolEntry { engine, sync })
    }
}
