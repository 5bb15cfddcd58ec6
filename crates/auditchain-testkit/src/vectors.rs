//! Golden test vectors for deterministic verification.
//!
//! A fixed three-event chain with its expected digests. Any change to the
//! canonical layout or the hash construction breaks these, which is the
//! point: stored logs would stop verifying.

use auditchain_core::{AuditEvent, Details, EventInput, GENESIS_PREVIOUS_HASH};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub id: &'static str,
    pub sequence: u64,
    /// Unix milliseconds.
    pub timestamp: i64,
    pub event_type: &'static str,
    pub action: &'static str,
    pub actor: &'static str,
    pub document_id: Option<&'static str>,
    /// JSON object.
    pub details: Value,
    pub session_id: Option<&'static str>,
    pub ip_address: &'static str,
    pub user_agent: &'static str,
    /// Expected digest (hex), chained onto the previous vector.
    pub expected_hash: &'static str,
}

/// Canonical bytes of the first vector, hex.
pub const GENESIS_CANONICAL_HEX: &str = concat!(
    "ab00782430303030303030302d303030302d343030302d383030302d30303030",
    "3030303030303031010102",
    "1b00000194658b1000",
    "036f73657373696f6e5f73746172746564",
    "0474557365722073657373696f6e2073746172746564",
    "056c757365722d61646d696e2d31",
    "06f6",
    "07a0",
    "086e64656d6f2d73657373696f6e2d31",
    "09a200693132372e302e302e31016c44656d6f2042726f77736572",
    "0a60",
);

/// Get all golden test vectors, in chain order.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "genesis session start",
            id: "00000000-0000-4000-8000-000000000001",
            sequence: 1,
            timestamp: 1736870400000, // 2025-01-14T16:00:00Z
            event_type: "session_started",
            action: "User session started",
            actor: "user-admin-1",
            document_id: None,
            details: json!({}),
            session_id: Some("demo-session-1"),
            ip_address: "127.0.0.1",
            user_agent: "Demo Browser",
            expected_hash: "1bc3b795eb63ef83d720706614db802d78b963f226bb4b58f737a444c76afca2",
        },
        GoldenVector {
            name: "upload with mixed details",
            id: "00000000-0000-4000-8000-000000000002",
            sequence: 2,
            timestamp: 1736870401000,
            event_type: "upload_completed",
            action: "Document uploaded",
            actor: "user-admin-1",
            document_id: Some("doc-001"),
            details: json!({
                "fileName": "contract.pdf",
                "fileSize": 52480,
                "pages": [1, 2, 3],
                "encrypted": false
            }),
            session_id: Some("demo-session-1"),
            ip_address: "127.0.0.1",
            user_agent: "Demo Browser",
            expected_hash: "49bd9770bb30c01ac3e1d6e9b849d49000d34e713b9553d2ab1e6d51e17a601c",
        },
        GoldenVector {
            name: "masking with nested, negative, float and unicode details",
            id: "00000000-0000-4000-8000-000000000003",
            sequence: 3,
            timestamp: 1736870402000,
            event_type: "masking_succeeded",
            action: "Masking completed",
            actor: "user-reviewer-7",
            document_id: Some("doc-001"),
            details: json!({
                "itemsFound": 12,
                "offset": -3,
                "confidence": 0.875,
                "categories": { "ssn": 2, "email": 10 },
                "note": null,
                "reviewer": "Zoë"
            }),
            session_id: None,
            ip_address: "",
            user_agent: "",
            expected_hash: "e79f1d5c25498a788e3f109a352002c11a1eb5f190601afd4164065c45cefe06",
        },
    ]
}

/// Seal a vector onto `previous_hash`.
pub fn event_from_vector(vector: &GoldenVector, previous_hash: &str) -> AuditEvent {
    let details: Details = match &vector.details {
        Value::Object(map) => map.clone(),
        _ => Details::new(),
    };

    let mut input = EventInput::new(vector.event_type, vector.action, vector.actor)
        .details(details)
        .ip_address(vector.ip_address)
        .user_agent(vector.user_agent);
    if let Some(doc) = vector.document_id {
        input = input.document(doc);
    }
    if let Some(session) = vector.session_id {
        input = input.session(session);
    }

    let timestamp = Utc
        .timestamp_millis_opt(vector.timestamp)
        .single()
        .unwrap_or_default();

    AuditEvent::seal(input, vector.id, vector.sequence, timestamp, previous_hash)
}

/// The vectors sealed into one chain.
pub fn golden_chain() -> Vec<AuditEvent> {
    let mut events: Vec<AuditEvent> = Vec::new();
    for vector in all_vectors() {
        let previous = events
            .last()
            .map(|e| e.hash.as_str())
            .unwrap_or(GENESIS_PREVIOUS_HASH);
        let event = event_from_vector(&vector, previous);
        events.push(event);
    }
    events
}

/// Check every vector against its expected digest.
///
/// Returns `(name, matches, computed_hex)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .zip(golden_chain())
        .map(|(v, event)| (v.name.to_string(), event.hash == v.expected_hash, event.hash))
        .collect()
}
