//! # auditchain
//!
//! Tamper-evident audit trail: an append-only log of structured events in
//! which every event carries a SHA-256 digest chained to its predecessor.
//!
//! ## Overview
//!
//! - **Log**: append an event; the trail assigns id, sequence, timestamp and
//!   chain link under a single sequencer lock
//! - **Query**: filter by actor, event type, document and time range, with
//!   statistics over the whole log
//! - **Verify**: recompute every digest and link, reporting each break
//! - **Export**: render a filtered view as CSV
//!
//! ## Key Concepts
//!
//! - **Event**: Immutable once appended. Corrections are new events.
//! - **Chain**: `hash(n) = SHA-256(previous_hash || canonical(event n))`.
//! - **Anchor**: Where a bounded log's retained chain starts after older
//!   events were dropped.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use auditchain::{AuditConfig, AuditTrail, EventInput, QueryFilter};
//!
//! async fn example() {
//!     let trail = AuditTrail::open(AuditConfig::from_env()).unwrap();
//!
//!     trail
//!         .log_event(
//!             EventInput::new("upload_completed", "Document uploaded", "user-42")
//!                 .document("doc-7")
//!                 .detail("fileName", "contract.pdf"),
//!         )
//!         .await
//!         .unwrap();
//!
//!     let result = trail.query(&QueryFilter::all().actor("user-42")).await.unwrap();
//!     println!("{} of {} events", result.events.len(), result.stats.total_events);
//!
//!     let report = trail.verify().await.unwrap();
//!     assert!(report.is_valid);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `auditchain::core` - Event model, hashing, query, stats, verification, CSV
//! - `auditchain::store` - Storage abstraction and backends

pub mod config;
pub mod error;
pub mod sequencer;
mod timeout;
pub mod trail;

pub use auditchain_core as core;
pub use auditchain_store as store;

pub use config::AuditConfig;
pub use error::{AuditError, Result};
pub use sequencer::{Sequencer, SequencerGuard};
pub use trail::AuditTrail;

pub use auditchain_core::{
    export_filename, AuditEvent, DocumentMarkers, EventInput, Issue, IssueKind, QueryFilter,
    QueryResult, Stats, VerificationReport,
};
pub use auditchain_store::{EventStore, StoreConfig};
