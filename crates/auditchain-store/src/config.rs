//! Runtime selection of a storage backend.

use std::path::PathBuf;

use tracing::info;

use crate::error::Result;
use crate::file::FileStore;
use crate::memory::{MemoryStore, DEFAULT_RETENTION};
use crate::sqlite::SqliteStore;
use crate::traits::EventStore;

/// Default location of the file backend.
pub const DEFAULT_FILE_PATH: &str = "./audit-log.jsonl";

/// Default location of the SQLite backend.
pub const DEFAULT_SQLITE_PATH: &str = "./audit-log.db";

/// Which backend to open, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// In-process storage. `retention: None` keeps every event.
    Memory { retention: Option<usize> },
    /// Append-only JSON-lines file.
    File { path: PathBuf },
    /// SQLite database file.
    Sqlite { path: PathBuf },
}

impl StoreConfig {
    /// Short backend name, as used in configuration.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreConfig::Memory { .. } => "memory",
            StoreConfig::File { .. } => "file",
            StoreConfig::Sqlite { .. } => "sqlite",
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Memory {
            retention: Some(DEFAULT_RETENTION),
        }
    }
}

/// Open the configured backend behind a trait object.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn EventStore>> {
    let store: Box<dyn EventStore> = match config {
        StoreConfig::Memory { retention: Some(k) } => Box::new(MemoryStore::bounded(*k)),
        StoreConfig::Memory { retention: None } => Box::new(MemoryStore::new()),
        StoreConfig::File { path } => Box::new(FileStore::open(path)?),
        StoreConfig::Sqlite { path } => Box::new(SqliteStore::open(path)?),
    };

    info!(backend = config.kind(), "audit store opened");
    Ok(store)
}
