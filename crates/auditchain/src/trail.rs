//! The AuditTrail: unified API for logging, querying, verifying and
//! exporting audit events.

use std::sync::Arc;

use auditchain_core::{
    render_csv, verify_chain, AuditEvent, EventInput, QueryFilter, QueryResult, Stats,
    VerificationReport,
};
use auditchain_store::{open_store, EventStore};
use tracing::{debug, error, info, warn};

use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::sequencer::Sequencer;
use crate::timeout::bounded;

/// The main audit trail.
///
/// Provides a unified API for:
/// - Appending events to the hash chain
/// - Filtered queries with log-wide statistics
/// - Whole-chain integrity verification
/// - CSV export
///
/// Only [`log_event`](Self::log_event) writes. Reads never take part in
/// sequencing and see every acknowledged event.
pub struct AuditTrail<S: EventStore + ?Sized> {
    /// Configuration.
    config: AuditConfig,
    /// Serializes appends.
    sequencer: Sequencer,
    /// The storage backend.
    store: Arc<S>,
}

impl AuditTrail<dyn EventStore> {
    /// Open the backend named in `config`.
    pub fn open(config: AuditConfig) -> Result<Self> {
        let store = open_store(&config.store).map_err(|source| {
            error!(backend = config.store.kind(), error = %source, "failed to open audit store");
            AuditError::StorageUnavailable {
                operation: "open",
                source,
            }
        })?;
        Ok(Self::from_arc(Arc::from(store), config))
    }

    /// Open the backend named by the environment.
    pub fn from_env() -> Result<Self> {
        Self::open(AuditConfig::from_env())
    }
}

impl<S: EventStore> AuditTrail<S> {
    /// Create a trail over an existing store.
    pub fn new(store: S, config: AuditConfig) -> Self {
        Self::from_arc(Arc::new(store), config)
    }
}

impl<S: EventStore + ?Sized> AuditTrail<S> {
    /// Create a trail over a shared store.
    pub fn from_arc(store: Arc<S>, config: AuditConfig) -> Self {
        Self {
            config,
            sequencer: Sequencer::new(),
            store,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Write Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append an event to the log.
    ///
    /// Assigns id, sequence, timestamp and chain link, and returns the
    /// sealed event once the backend has acknowledged it. A failure here
    /// means the action went unaudited; it is logged at error level and
    /// must not be ignored by the caller.
    pub async fn log_event(&self, input: EventInput) -> Result<AuditEvent> {
        let event_type = input.event_type.clone();
        let actor = input.actor.clone();

        let guard = self.sequencer.lock().await;
        match guard.append(&*self.store, input, self.config.io_timeout).await {
            Ok(event) => {
                info!(
                    event_type = %event.event_type,
                    actor = %event.actor,
                    sequence = event.sequence,
                    "audit event logged"
                );
                Ok(event)
            }
            Err(e) => {
                error!(
                    event_type = %event_type,
                    actor = %actor,
                    error = %e,
                    "failed to log audit event"
                );
                Err(e)
            }
        }
    }

    /// Log `inputs` in order, but only if the log is empty.
    ///
    /// Returns the number of events written.
    pub async fn seed_if_empty<I>(&self, inputs: I) -> Result<usize>
    where
        I: IntoIterator<Item = EventInput>,
    {
        let guard = self.sequencer.lock().await;
        let timeout = self.config.io_timeout;

        if bounded("count", timeout, self.store.count()).await? > 0 {
            debug!("audit log not empty, skipping seed");
            return Ok(0);
        }

        let mut written = 0;
        for input in inputs {
            guard.append(&*self.store, input, timeout).await?;
            written += 1;
        }

        info!(events = written, "seeded empty audit log");
        Ok(written)
    }

    /// Remove every event. Out-of-band administration only.
    pub async fn reset(&self) -> Result<()> {
        let _guard = self.sequencer.lock().await;
        bounded("reset", self.config.io_timeout, self.store.reset()).await?;
        warn!("audit log reset");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Events matching `filter`, newest first, with statistics over the
    /// whole log.
    pub async fn query(&self, filter: &QueryFilter) -> Result<QueryResult> {
        filter.validate()?;

        let all = self.list("query").await?;
        let stats = Stats::from_events(&all, &self.config.document_markers);
        let events = filter.apply(all)?;

        Ok(QueryResult { events, stats })
    }

    /// Statistics over the whole log.
    pub async fn stats(&self) -> Result<Stats> {
        let all = self.list("stats").await?;
        Ok(Stats::from_events(&all, &self.config.document_markers))
    }

    /// Check every event's link, position and digest.
    ///
    /// An invalid chain is a successful verification with issues; `Err` is
    /// reserved for storage failures. Use [`verify_strict`](Self::verify_strict)
    /// to turn issues into an error.
    pub async fn verify(&self) -> Result<VerificationReport> {
        let timeout = self.config.io_timeout;

        // Events and anchor must come from the same retention state.
        let (events, anchor) = {
            let _guard = self.sequencer.lock().await;
            let events = bounded("verify", timeout, self.store.list_events()).await?;
            let anchor = bounded("verify", timeout, self.store.anchor()).await?;
            (events, anchor)
        };

        let report = verify_chain(&events, anchor.as_ref());
        if report.is_valid {
            debug!(total_events = report.total_events, "audit chain verified");
        } else {
            warn!(
                total_events = report.total_events,
                issues = report.issues.len(),
                "audit chain verification failed"
            );
        }
        Ok(report)
    }

    /// Like [`verify`](Self::verify), but an invalid chain is
    /// [`AuditError::ChainCorrupted`].
    pub async fn verify_strict(&self) -> Result<VerificationReport> {
        self.verify()
            .await?
            .into_result()
            .map_err(|issues| AuditError::ChainCorrupted { issues })
    }

    /// CSV of the events matching `filter`, newest first.
    pub async fn export(&self, filter: &QueryFilter) -> Result<String> {
        filter.validate()?;

        let events = filter.apply(self.list("export").await?)?;
        let csv = render_csv(&events)?;
        debug!(rows = events.len(), "audit log exported");
        Ok(csv)
    }

    async fn list(&self, operation: &'static str) -> Result<Vec<AuditEvent>> {
        bounded(operation, self.config.io_timeout, self.store.list_events()).await
    }
}
