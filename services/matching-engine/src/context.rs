//! Application context
//!
//! One explicit struct built at startup holds the configuration, the
//! relational-store handle and the engine registry. Everything receives
//! it by injection; there are no globals.

use crate::registry::EngineRegistry;
use persistence::{Compression, OrderStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Runtime knobs shared by every engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding `<symbol>.events` logs and their metadata
    pub data_dir: PathBuf,
    /// Durable-log writer timeout; expiry fails the caller's operation
    pub write_timeout: Duration,
    /// Largest framed payload the dispatcher accepts
    pub max_frame_size: usize,
    /// Upper bound on per-side snapshot depth
    pub depth_cap: usize,
    /// Payload transform for log and wire records
    pub compression: Compression,
    /// Synchronizer sleep when the log has nothing new
    pub idle_backoff: Duration,
    /// Engine command channel depth
    pub channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            write_timeout: Duration::from_secs(5),
            max_frame_size: 64 * 1024,
            depth_cap: 100,
            compression: Compression::None,
            idle_backoff: Duration::from_millis(50),
            channel_capacity: 256,
        }
    }
}

/// Top-level application state, built once and passed explicitly
pub struct App {
    pub config: EngineConfig,
    pub store: Arc<dyn OrderStore>,
    pub registry: EngineRegistry,
}

impl App {
    pub fn new(config: EngineConfig, store: Arc<dyn OrderStore>) -> Self {
        let registry = EngineRegistry::new(config.clone(), Arc::clone(&store));
        Self {
            config,
            store,
            registry,
        }
    }
}
