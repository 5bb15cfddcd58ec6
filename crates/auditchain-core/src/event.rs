//! Audit events: the atomic unit of the trail.
//!
//! An event is immutable once sealed. `hash` commits to every other field,
//! including `previous_hash`, so editing any stored field is detectable by
//! recomputation alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::canonical::canonical_event_bytes;
use crate::hash::{compute_hash, ChainHash};

/// Placeholder recorded when the caller does not know a value.
pub const UNKNOWN: &str = "unknown";

/// Caller-supplied JSON payload attached to an event.
pub type Details = Map<String, Value>;

/// Free-form provenance of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Originating network address.
    pub ip_address: String,
    /// Client identifier (browser user agent, service name).
    pub user_agent: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            ip_address: UNKNOWN.to_string(),
            user_agent: UNKNOWN.to_string(),
        }
    }
}

/// A sealed, hash-linked audit event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Process-unique identifier.
    pub id: String,
    /// Position in the log, starting at 1.
    pub sequence: u64,
    /// Creation time, assigned by the sequencer (millisecond precision).
    pub timestamp: DateTime<Utc>,
    /// Short symbolic tag, e.g. `upload_completed`.
    pub event_type: String,
    /// Human-readable description.
    pub action: String,
    /// User or session responsible.
    pub actor: String,
    /// Subject document, if any.
    pub document_id: Option<String>,
    /// Caller payload.
    #[serde(default)]
    pub details: Details,
    /// Correlates events of one logical session.
    pub session_id: String,
    /// Provenance.
    #[serde(default)]
    pub metadata: Metadata,
    /// Hex SHA-256 over `previous_hash || canonical(event without hash)`.
    pub hash: String,
    /// `hash` of the event at `sequence - 1`, empty for the genesis event.
    pub previous_hash: String,
}

impl AuditEvent {
    /// Build an event from caller input and sequencer-assigned fields, and
    /// compute its hash.
    pub fn seal(
        input: EventInput,
        id: impl Into<String>,
        sequence: u64,
        timestamp: DateTime<Utc>,
        previous_hash: impl Into<String>,
    ) -> Self {
        let mut event = Self {
            id: id.into(),
            sequence,
            timestamp,
            event_type: input.event_type,
            action: input.action,
            actor: input.actor,
            document_id: input.document_id,
            details: input.details,
            session_id: input.session_id.unwrap_or_else(|| UNKNOWN.to_string()),
            metadata: input.metadata,
            hash: String::new(),
            previous_hash: previous_hash.into(),
        };
        event.hash = event.compute_hash().to_hex();
        event
    }

    /// Canonical bytes of every field except `hash`.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical_event_bytes(self)
    }

    /// Recompute the digest from the stored fields.
    pub fn compute_hash(&self) -> ChainHash {
        compute_hash(&self.previous_hash, &self.canonical_bytes())
    }

    /// True if the stored hash matches a fresh recomputation.
    pub fn hash_matches(&self) -> bool {
        self.compute_hash().to_hex() == self.hash
    }

    /// True for the first event of an untruncated log.
    pub fn is_genesis(&self) -> bool {
        self.sequence == 1 && self.previous_hash.is_empty()
    }
}

/// What a collaborator supplies to `log_event`.
///
/// Everything the engine assigns itself (id, sequence, timestamp, hashes) is
/// absent here; callers cannot influence those fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    pub event_type: String,
    pub action: String,
    pub actor: String,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub details: Details,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl EventInput {
    /// Start building an input with the three mandatory fields.
    pub fn new(
        event_type: impl Into<String>,
        action: impl Into<String>,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            action: action.into(),
            actor: actor.into(),
            document_id: None,
            details: Details::new(),
            session_id: None,
            metadata: Metadata::default(),
        }
    }

    /// Set the subject document.
    pub fn document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    /// Add one payload entry.
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Replace the whole payload.
    pub fn details(mut self, details: Details) -> Self {
        self.details = details;
        self
    }

    /// Set the session identifier.
    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Set the originating address.
    pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
        self.metadata.ip_address = ip.into();
        self
    }

    /// Set the client identifier.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.metadata.user_agent = agent.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::GENESIS_PREVIOUS_HASH;
    use crate::types::now_millis;
    use serde_json::json;

    fn sample(previous: &str, sequence: u64) -> AuditEvent {
        let input = EventInput::new("upload_completed", "Document upload completed", "u1")
            .document("d1")
            .detail("fileName", "contract.pdf")
            .session("s1");
        AuditEvent::seal(input, "id-1", sequence, now_millis(), previous)
    }

    #[test]
    fn test_seal_sets_hash_and_defaults() {
        let input = EventInput::new("session_started", "User session started", "u1");
        let event = AuditEvent::seal(input, "id-0", 1, now_millis(), GENESIS_PREVIOUS_HASH);

        assert_eq!(event.hash.len(), 64);
        assert!(event.hash_matches());
        assert!(event.is_genesis());
        assert_eq!(event.session_id, UNKNOWN);
        assert_eq!(event.metadata.ip_address, UNKNOWN);
        assert_eq!(event.metadata.user_agent, UNKNOWN);
        assert!(event.details.is_empty());
    }

    #[test]
    fn test_any_field_edit_breaks_hash() {
        let base = sample("", 1);

        let mut e = base.clone();
        e.action.push('!');
        assert!(!e.hash_matches());

        let mut e = base.clone();
        e.actor = "u2".into();
        assert!(!e.hash_matches());

        let mut e = base.clone();
        e.document_id = None;
        assert!(!e.hash_matches());

        let mut e = base.clone();
        e.details.insert("fileName".into(), json!("other.pdf"));
        assert!(!e.hash_matches());

        let mut e = base.clone();
        e.metadata.ip_address = "10.0.0.1".into();
        assert!(!e.hash_matches());

        let mut e = base.clone();
        e.timestamp += chrono::Duration::milliseconds(1);
        assert!(!e.hash_matches());

        let mut e = base;
        e.previous_hash = "00".into();
        assert!(!e.hash_matches());
    }

    #[test]
    fn test_json_roundtrip_preserves_hash() {
        let event = sample("abc", 2);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"eventType\""));
        assert!(json.contains("\"previousHash\""));
        assert!(json.contains("\"ipAddress\""));

        let decoded: AuditEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, event);
        assert!(decoded.hash_matches());
    }

    #[test]
    fn test_input_from_wire_json() {
        let input: EventInput = serde_json::from_value(json!({
            "eventType": "page_visited",
            "action": "Navigated to Dashboard",
            "actor": "user-admin-1",
            "details": { "pageName": "Dashboard" }
        }))
        .unwrap();

        assert_eq!(input.event_type, "page_visited");
        assert_eq!(input.document_id, None);
        assert_eq!(input.metadata, Metadata::default());
        assert_eq!(input.details["pageName"], "Dashboard");
    }
}
