//! The sequencer: assigns position, timestamp and chain link to new events.
//!
//! Reading the head, sealing the next event and appending it must happen as
//! one step. Two writers that both read head `n` would both produce sequence
//! `n + 1` with the same `previous_hash`, forking the chain. [`Sequencer`]
//! serializes that critical section with an async mutex held across the
//! backend calls.

use std::time::Duration;

use auditchain_core::{now_millis, AuditEvent, EventInput, GENESIS_PREVIOUS_HASH};
use auditchain_store::EventStore;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{Result, APPEND};
use crate::timeout::bounded;

/// Serializes appends to one log.
#[derive(Debug, Default)]
pub struct Sequencer {
    lock: Mutex<()>,
}

/// Exclusive right to append, held until dropped.
pub struct SequencerGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access.
    pub async fn lock(&self) -> SequencerGuard<'_> {
        SequencerGuard {
            _guard: self.lock.lock().await,
        }
    }
}

impl SequencerGuard<'_> {
    /// Seal `input` against the current head and append it.
    pub async fn append<S>(
        &self,
        store: &S,
        input: EventInput,
        io_timeout: Duration,
    ) -> Result<AuditEvent>
    where
        S: EventStore + ?Sized,
    {
        append_unsynchronized(store, input, io_timeout).await
    }
}

/// The sequencing step without the lock. Callers must hold a
/// [`SequencerGuard`] unless they want to observe the race.
pub(crate) async fn append_unsynchronized<S>(
    store: &S,
    input: EventInput,
    io_timeout: Duration,
) -> Result<AuditEvent>
where
    S: EventStore + ?Sized,
{
    let head = bounded("head", io_timeout, store.head()).await?;

    let (sequence, previous_hash, timestamp) = match head {
        Some(head) => (head.sequence + 1, head.hash, now_millis().max(head.timestamp)),
        None => (1, GENESIS_PREVIOUS_HASH.to_string(), now_millis()),
    };

    let event = AuditEvent::seal(
        input,
        Uuid::new_v4().to_string(),
        sequence,
        timestamp,
        previous_hash,
    );

    bounded(APPEND, io_timeout, store.append_event(&event)).await?;
    Ok(event)
}
