//! # auditchain core
//!
//! Pure primitives for a tamper-evident audit trail: events, canonical
//! encoding, the hash chain, and the read-side engines over a log.
//!
//! This crate contains no I/O and no storage. Everything here is a function
//! of the events it is handed.
//!
//! ## Key Types
//!
//! - [`AuditEvent`] - A sealed, hash-linked record
//! - [`EventInput`] - What a caller supplies to log an event
//! - [`ChainHash`] - SHA-256 digest linking an event to its predecessor
//! - [`QueryFilter`] / [`Stats`] - Read-side selection and aggregation
//! - [`VerificationReport`] - Result of walking the chain
//!
//! ## Canonicalization
//!
//! Events are hashed over deterministic CBOR. See [`canonical`] module.

pub mod canonical;
pub mod error;
pub mod event;
pub mod export;
pub mod hash;
pub mod kinds;
pub mod query;
pub mod stats;
pub mod types;
pub mod verify;

pub use canonical::{canonical_event_bytes, canonical_json_bytes};
pub use error::{CoreError, Result};
pub use event::{AuditEvent, Details, EventInput, Metadata, UNKNOWN};
pub use export::{export_filename, render_csv, CSV_HEADER};
pub use hash::{compute_hash, ChainHash, GENESIS_PREVIOUS_HASH};
pub use query::{QueryFilter, QueryResult};
pub use stats::{DocumentMarkers, Stats, TimeRange};
pub use types::{now_millis, ChainHead, RetentionAnchor};
pub use verify::{verify_chain, Issue, IssueKind, VerificationReport};
