//! In-memory implementation of the EventStore trait.
//!
//! Unbounded by default. A bounded store keeps only the newest `capacity`
//! events for resource-constrained deployments; dropped events leave a
//! [`RetentionAnchor`] behind so the retained chain still verifies.

use std::collections::VecDeque;
use std::sync::RwLock;

use async_trait::async_trait;
use auditchain_core::{now_millis, AuditEvent, ChainHead, RetentionAnchor};
use tracing::{debug, warn};

use crate::error::Result;
use crate::traits::EventStore;

/// Retention used by [`MemoryStore::bounded_default`].
pub const DEFAULT_RETENTION: usize = 1000;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
    capacity: Option<usize>,
}

struct MemoryStoreInner {
    /// Retained events, oldest first.
    events: VecDeque<AuditEvent>,

    /// Set once retention has dropped anything.
    anchor: Option<RetentionAnchor>,
}

impl MemoryStore {
    /// Create a new empty store that keeps every event.
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    /// Create a store that keeps at most `capacity` events (minimum 1).
    pub fn bounded(capacity: usize) -> Self {
        Self::with_capacity(Some(capacity.max(1)))
    }

    /// Bounded store with [`DEFAULT_RETENTION`].
    pub fn bounded_default() -> Self {
        Self::bounded(DEFAULT_RETENTION)
    }

    fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                events: VecDeque::new(),
                anchor: None,
            }),
            capacity,
        }
    }

    /// Maximum retained events, `None` if unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    fn enforce_capacity(&mut self, capacity: usize) {
        let overflow = self.events.len().saturating_sub(capacity);
        if overflow == 0 {
            return;
        }

        let mut last_dropped = None;
        for _ in 0..overflow {
            last_dropped = self.events.pop_front();
        }

        let (Some(dropped), Some(first)) = (last_dropped, self.events.front()) else {
            return;
        };

        let previously_dropped = self.anchor.as_ref().map(|a| a.dropped).unwrap_or(0);
        if self.anchor.is_none() {
            warn!(
                capacity,
                first_sequence = first.sequence,
                "audit log reached retention limit, dropping oldest events"
            );
        } else {
            debug!(first_sequence = first.sequence, "retention re-anchored");
        }

        self.anchor = Some(RetentionAnchor {
            first_sequence: first.sequence,
            previous_hash: dropped.hash,
            dropped: previously_dropped + overflow as u64,
            truncated_at: now_millis(),
        });
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn append_event(&self, event: &AuditEvent) -> Result<()> {
        let mut inner = self.inner.write()?;

        inner.events.push_back(event.clone());
        if let Some(capacity) = self.capacity {
            inner.enforce_capacity(capacity);
        }

        Ok(())
    }

    async fn list_events(&self) -> Result<Vec<AuditEvent>> {
        let inner = self.inner.read()?;
        Ok(inner.events.iter().cloned().collect())
    }

    async fn count(&self) -> Result<u64> {
        let inner = self.inner.read()?;
        Ok(inner.events.len() as u64)
    }

    async fn head(&self) -> Result<Option<ChainHead>> {
        let inner = self.inner.read()?;
        Ok(inner.events.back().map(ChainHead::of))
    }

    async fn anchor(&self) -> Result<Option<RetentionAnchor>> {
        let inner = self.inner.read()?;
        Ok(inner.anchor.clone())
    }

    async fn reset(&self) -> Result<()> {
        let mut inner = self.inner.write()?;
        inner.events.clear();
        inner.anchor = None;
        Ok(())
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl crate::traits::Tamper for MemoryStore {
    async fn tamper_with(&self, sequence: u64, f: crate::traits::TamperFn) -> Result<bool> {
        let mut inner = self.inner.write()?;
        match inner.events.iter_mut().find(|e| e.sequence == sequence) {
            Some(event) => {
                f(event);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Tamper;
    use auditchain_core::{verify_chain, EventInput};

    fn chain(n: u64) -> Vec<AuditEvent> {
        let mut events: Vec<AuditEvent> = Vec::new();
        for seq in 1..=n {
            let prev = events.last().map(|e| e.hash.clone()).unwrap_or_default();
            let input = EventInput::new("page_visited", format!("visit {seq}"), "u1");
            events.push(AuditEvent::seal(input, format!("id-{seq}"), seq, now_millis(), prev));
        }
        events
    }

    #[tokio::test]
    async fn test_append_and_list() {
        let store = MemoryStore::new();
        assert_eq!(store.head().await.unwrap(), None);

        for event in chain(3) {
            store.append_event(&event).await.unwrap();
        }

        let events = store.list_events().await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(store.count().await.unwrap(), 3);
        assert_eq!(store.head().await.unwrap().unwrap().sequence, 3);
        assert_eq!(store.anchor().await.unwrap(), None);
        assert!(verify_chain(&events, None).is_valid);
    }

    #[tokio::test]
    async fn test_bounded_retention_anchors_chain() {
        let store = MemoryStore::bounded(3);
        let all = chain(5);
        for event in &all {
            store.append_event(event).await.unwrap();
        }

        let events = store.list_events().await.unwrap();
        let seqs: Vec<u64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![3, 4, 5]);
        assert_eq!(store.count().await.unwrap(), 3);
        assert_eq!(store.head().await.unwrap().unwrap().sequence, 5);

        let anchor = store.anchor().await.unwrap().unwrap();
        assert_eq!(anchor.first_sequence, 3);
        assert_eq!(anchor.previous_hash, all[1].hash);
        assert_eq!(anchor.dropped, 2);

        // Retained events are stored verbatim.
        assert_eq!(events[0], all[2]);
        let report = verify_chain(&events, Some(&anchor));
        assert!(report.is_valid, "{:?}", report.issues);
    }

    #[tokio::test]
    async fn test_reset_clears_anchor() {
        let store = MemoryStore::bounded(1);
        for event in chain(2) {
            store.append_event(&event).await.unwrap();
        }
        assert!(store.anchor().await.unwrap().is_some());

        store.reset().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.anchor().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_tamper_with() {
        let store = MemoryStore::new();
        for event in chain(2) {
            store.append_event(&event).await.unwrap();
        }

        let hit = store
            .tamper_with(2, Box::new(|e: &mut AuditEvent| e.actor = "mallory".into()))
            .await
            .unwrap();
        assert!(hit);
        assert!(!store.tamper_with(9, Box::new(|_: &mut AuditEvent| {})).await.unwrap());

        let events = store.list_events().await.unwrap();
        assert_eq!(events[1].actor, "mallory");
        assert!(!verify_chain(&events, None).is_valid);
    }

    proptest::proptest! {
        #[test]
        fn test_retained_chain_always_verifies(capacity in 1usize..8, len in 0u64..20) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (events, anchor) = rt.block_on(async {
                let store = MemoryStore::bounded(capacity);
                for event in chain(len) {
                    store.append_event(&event).await.unwrap();
                }
                (store.list_events().await.unwrap(), store.anchor().await.unwrap())
            });

            proptest::prop_assert_eq!(events.len() as u64, len.min(capacity as u64));
            proptest::prop_assert_eq!(anchor.is_some(), len > capacity as u64);
            proptest::prop_assert!(verify_chain(&events, anchor.as_ref()).is_valid);
        }
    }

    #[test]
    fn test_bounded_minimum_capacity() {
        assert_eq!(MemoryStore::bounded(0).capacity(), Some(1));
        assert_eq!(MemoryStore::bounded_default().capacity(), Some(DEFAULT_RETENTION));
        assert_eq!(MemoryStore::new().capacity(), None);
    }
}
