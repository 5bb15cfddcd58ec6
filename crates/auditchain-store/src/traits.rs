//! EventStore trait: the capability interface every backend provides.
//!
//! The facade never knows which backend is active. Backends are chosen at
//! runtime through [`open_store`](crate::open_store), which is why `Arc<S>`
//! and `Box<dyn EventStore>` implement the trait as well.

use std::sync::Arc;

use async_trait::async_trait;
use auditchain_core::{AuditEvent, ChainHead, RetentionAnchor};

use crate::error::Result;

/// Async interface for audit event persistence.
///
/// # Contract
///
/// - `append_event` is atomic from a reader's point of view: a concurrent
///   `list_events` sees the whole event or none of it.
/// - `list_events` returns events in ascending `sequence` order.
/// - Backends store events verbatim. They never assign sequence numbers or
///   hashes; that is the sequencer's job.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist a fully sealed event.
    async fn append_event(&self, event: &AuditEvent) -> Result<()>;

    /// All retained events, ascending by sequence.
    async fn list_events(&self) -> Result<Vec<AuditEvent>>;

    /// Number of retained events.
    async fn count(&self) -> Result<u64>;

    /// The newest retained event's position, hash and timestamp.
    async fn head(&self) -> Result<Option<ChainHead>>;

    /// Where the retained chain starts after bounded retention dropped
    /// older events. `None` for backends that keep everything.
    async fn anchor(&self) -> Result<Option<RetentionAnchor>> {
        Ok(None)
    }

    /// Remove every event. Out-of-band administration only.
    async fn reset(&self) -> Result<()>;
}

#[async_trait]
impl<S: EventStore + ?Sized> EventStore for Arc<S> {
    async fn append_event(&self, event: &AuditEvent) -> Result<()> {
        (**self).append_event(event).await
    }

    async fn list_events(&self) -> Result<Vec<AuditEvent>> {
        (**self).list_events().await
    }

    async fn count(&self) -> Result<u64> {
        (**self).count().await
    }

    async fn head(&self) -> Result<Option<ChainHead>> {
        (**self).head().await
    }

    async fn anchor(&self) -> Result<Option<RetentionAnchor>> {
        (**self).anchor().await
    }

    async fn reset(&self) -> Result<()> {
        (**self).reset().await
    }
}

#[async_trait]
impl<S: EventStore + ?Sized> EventStore for Box<S> {
    async fn append_event(&self, event: &AuditEvent) -> Result<()> {
        (**self).append_event(event).await
    }

    async fn list_events(&self) -> Result<Vec<AuditEvent>> {
        (**self).list_events().await
    }

    async fn count(&self) -> Result<u64> {
        (**self).count().await
    }

    async fn head(&self) -> Result<Option<ChainHead>> {
        (**self).head().await
    }

    async fn anchor(&self) -> Result<Option<RetentionAnchor>> {
        (**self).anchor().await
    }

    async fn reset(&self) -> Result<()> {
        (**self).reset().await
    }
}

/// Edit applied by [`Tamper::tamper_with`].
///
/// An alias keeps `#[async_trait]` from binding the `&mut AuditEvent`
/// lifetime to the method's own.
#[cfg(any(test, feature = "test-util"))]
pub type TamperFn = Box<dyn FnOnce(&mut AuditEvent) + Send>;

/// Direct mutation of stored events, bypassing the append path.
///
/// Only compiled for tests. Lets integration tests simulate an attacker
/// editing storage so the verifier has something to find.
#[cfg(any(test, feature = "test-util"))]
#[async_trait]
pub trait Tamper: EventStore {
    /// Apply `f` to the stored event at `sequence` without recomputing its
    /// hash. Returns `false` if no such event is stored.
    async fn tamper_with(&self, sequence: u64, f: TamperFn) -> Result<bool>;
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl<S: Tamper + ?Sized> Tamper for Arc<S> {
    async fn tamper_with(&self, sequence: u64, f: TamperFn) -> Result<bool> {
        (**self).tamper_with(sequence, f).await
    }
}
