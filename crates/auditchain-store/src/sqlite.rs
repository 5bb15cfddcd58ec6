//! SQLite implementation of the EventStore trait.
//!
//! Durable row store using rusqlite with bundled SQLite, wrapped in async via
//! tokio::spawn_blocking. `sequence` is the primary key, so a second event
//! claiming an occupied position is rejected instead of forking the chain.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use auditchain_core::{now_millis, AuditEvent, ChainHead, Details, Metadata};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::EventStore;

const SELECT_EVENT: &str = "SELECT sequence, id, timestamp, event_type, action, actor,
        document_id, details, session_id, ip_address, user_agent, hash, previous_hash
     FROM audit_events";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path.as_ref())?;
        migration::migrate(&mut conn)?;
        debug!(path = %path.as_ref().display(), "opened sqlite store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Execute a blocking operation on the connection.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock()?;
            f(&mut conn)
        })
        .await?
    }
}

/// Column values of one row, before validation.
struct EventRow {
    sequence: i64,
    id: String,
    timestamp: i64,
    event_type: String,
    action: String,
    actor: String,
    document_id: Option<String>,
    details: String,
    session_id: String,
    ip_address: String,
    user_agent: String,
    hash: String,
    previous_hash: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        sequence: row.get("sequence")?,
        id: row.get("id")?,
        timestamp: row.get("timestamp")?,
        event_type: row.get("event_type")?,
        action: row.get("action")?,
        actor: row.get("actor")?,
        document_id: row.get("document_id")?,
        details: row.get("details")?,
        session_id: row.get("session_id")?,
        ip_address: row.get("ip_address")?,
        user_agent: row.get("user_agent")?,
        hash: row.get("hash")?,
        previous_hash: row.get("previous_hash")?,
    })
}

impl TryFrom<EventRow> for AuditEvent {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self> {
        let sequence = u64::try_from(row.sequence)
            .map_err(|_| StoreError::Corrupt(format!("negative sequence {}", row.sequence)))?;
        let timestamp = Utc.timestamp_millis_opt(row.timestamp).single().ok_or_else(|| {
            StoreError::Corrupt(format!(
                "sequence {sequence}: timestamp {} out of range",
                row.timestamp
            ))
        })?;
        let details: Details = serde_json::from_str(&row.details)?;

        Ok(AuditEvent {
            id: row.id,
            sequence,
            timestamp,
            event_type: row.event_type,
            action: row.action,
            actor: row.actor,
            document_id: row.document_id,
            details,
            session_id: row.session_id,
            metadata: Metadata {
                ip_address: row.ip_address,
                user_agent: row.user_agent,
            },
            hash: row.hash,
            previous_hash: row.previous_hash,
        })
    }
}

fn insert_event(conn: &Connection, event: &AuditEvent, details: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO audit_events (
            sequence, id, timestamp, event_type, action, actor, document_id,
            details, session_id, ip_address, user_agent, hash, previous_hash,
            recorded_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            event.sequence as i64,
            event.id,
            event.timestamp.timestamp_millis(),
            event.event_type,
            event.action,
            event.actor,
            event.document_id,
            details,
            event.session_id,
            event.metadata.ip_address,
            event.metadata.user_agent,
            event.hash,
            event.previous_hash,
            now_millis().timestamp_millis(),
        ],
    )?;
    Ok(())
}

#[async_trait]
impl EventStore for SqliteStore {
    async fn append_event(&self, event: &AuditEvent) -> Result<()> {
        let event = event.clone();
        let details = serde_json::to_string(&event.details)?;

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let occupied: Option<i64> = tx
                .query_row(
                    "SELECT sequence FROM audit_events WHERE sequence = ?1",
                    params![event.sequence as i64],
                    |row| row.get(0),
                )
                .optional()?;

            if occupied.is_some() {
                return Err(StoreError::Conflict {
                    sequence: event.sequence,
                });
            }

            insert_event(&tx, &event, &details)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn list_events(&self) -> Result<Vec<AuditEvent>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_EVENT} ORDER BY sequence ASC"))?;
            let rows = stmt
                .query_map([], read_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(AuditEvent::try_from).collect()
        })
        .await
    }

    async fn count(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM audit_events", [], |row| {
                row.get(0)
            })?;
            Ok(count as u64)
        })
        .await
    }

    async fn head(&self) -> Result<Option<ChainHead>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("{SELECT_EVENT} ORDER BY sequence DESC LIMIT 1"),
                    [],
                    read_row,
                )
                .optional()?;
            match row {
                Some(row) => Ok(Some(ChainHead::of(&AuditEvent::try_from(row)?))),
                None => Ok(None),
            }
        })
        .await
    }

    async fn reset(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM audit_events", [])?;
            Ok(())
        })
        .await
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl crate::traits::Tamper for SqliteStore {
    async fn tamper_with(&self, sequence: u64, f: crate::traits::TamperFn) -> Result<bool> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let row = tx
                .query_row(
                    &format!("{SELECT_EVENT} WHERE sequence = ?1"),
                    params![sequence as i64],
                    read_row,
                )
                .optional()?;
            let Some(row) = row else {
                return Ok(false);
            };

            let mut event = AuditEvent::try_from(row)?;
            f(&mut event);
            let details = serde_json::to_string(&event.details)?;

            tx.execute(
                "DELETE FROM audit_events WHERE sequence = ?1",
                params![sequence as i64],
            )?;
            insert_event(&tx, &event, &details)?;
            tx.commit()?;
            Ok(true)
        })
        .await
    }
}
