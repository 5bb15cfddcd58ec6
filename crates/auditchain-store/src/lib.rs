//! # auditchain store
//!
//! Storage abstraction for the audit trail. Provides a trait-based interface
//! for event persistence with in-memory, JSON-lines file and SQLite
//! implementations.
//!
//! ## Key Types
//!
//! - [`EventStore`] - The async trait every backend implements
//! - [`MemoryStore`] - In-process, optionally bounded
//! - [`FileStore`] - Append-only JSON lines, fsync per event
//! - [`SqliteStore`] - SQLite row store with schema migrations
//! - [`StoreConfig`] / [`open_store`] - Backend selection at runtime
//!
//! ## Usage
//!
//! ```rust,no_run
//! use auditchain_store::{open_store, EventStore, StoreConfig};
//!
//! async fn example() {
//!     let store = open_store(&StoreConfig::Sqlite { path: "audit.db".into() }).unwrap();
//!     let events = store.list_events().await.unwrap();
//!     println!("{} events", events.len());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Verbatim storage**: backends never assign sequence numbers or hashes
//! - **Conflict detection**: SQLite rejects a second event at an occupied sequence
//! - **Bounded retention**: the memory backend re-anchors instead of rewriting

pub mod config;
pub mod error;
pub mod file;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use config::{open_store, StoreConfig, DEFAULT_FILE_PATH, DEFAULT_SQLITE_PATH};
pub use error::{Result, StoreError};
pub use file::FileStore;
pub use memory::{MemoryStore, DEFAULT_RETENTION};
pub use sqlite::SqliteStore;
pub use traits::EventStore;

#[cfg(any(test, feature = "test-util"))]
pub use traits::{Tamper, TamperFn};
