//! Canonical CBOR encoding of audit events.
//!
//! Follows RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - Timestamps are i64 Unix milliseconds
//!
//! One deviation: JSON floats inside `details` are always written as 8-byte
//! IEEE-754 doubles instead of the shortest form. The choice is fixed, so the
//! output is still a pure function of the event.
//!
//! `details` key order never affects the bytes: object keys are sorted like
//! any other map. The `hash` field is never encoded.
//!
//! **This layout is frozen.** Changing it invalidates every stored hash.

use ciborium::value::{Integer, Value};
use serde_json::Value as Json;

use crate::event::AuditEvent;

/// Event field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const ID: u64 = 0;
    pub const SEQUENCE: u64 = 1;
    pub const TIMESTAMP: u64 = 2;
    pub const EVENT_TYPE: u64 = 3;
    pub const ACTION: u64 = 4;
    pub const ACTOR: u64 = 5;
    pub const DOCUMENT_ID: u64 = 6;
    pub const DETAILS: u64 = 7;
    pub const SESSION_ID: u64 = 8;
    pub const METADATA: u64 = 9;
    pub const PREVIOUS_HASH: u64 = 10;
}

/// Metadata sub-map keys.
mod metadata_keys {
    pub const IP_ADDRESS: u64 = 0;
    pub const USER_AGENT: u64 = 1;
}

/// Encode every field of an event except `hash` to canonical CBOR bytes.
pub fn canonical_event_bytes(event: &AuditEvent) -> Vec<u8> {
    encode_canonical(&event_to_cbor_value(event))
}

/// Encode a JSON value canonically (used for `details`, exposed for tests
/// and tooling that want to compare payloads byte-for-byte).
pub fn canonical_json_bytes(value: &Json) -> Vec<u8> {
    encode_canonical(&json_to_cbor_value(value))
}

/// Convert an event to a CBOR map with integer keys.
fn event_to_cbor_value(event: &AuditEvent) -> Value {
    let text = |s: &str| Value::Text(s.to_string());
    let key = |k: u64| Value::Integer(k.into());

    let document_id = match &event.document_id {
        Some(id) => text(id),
        None => Value::Null,
    };

    let details = Value::Map(
        event
            .details
            .iter()
            .map(|(k, v)| (text(k), json_to_cbor_value(v)))
            .collect(),
    );

    let metadata = Value::Map(vec![
        (key(metadata_keys::IP_ADDRESS), text(&event.metadata.ip_address)),
        (key(metadata_keys::USER_AGENT), text(&event.metadata.user_agent)),
    ]);

    Value::Map(vec![
        (key(keys::ID), text(&event.id)),
        (key(keys::SEQUENCE), Value::Integer(event.sequence.into())),
        (
            key(keys::TIMESTAMP),
            Value::Integer(event.timestamp.timestamp_millis().into()),
        ),
        (key(keys::EVENT_TYPE), text(&event.event_type)),
        (key(keys::ACTION), text(&event.action)),
        (key(keys::ACTOR), text(&event.actor)),
        (key(keys::DOCUMENT_ID), document_id),
        (key(keys::DETAILS), details),
        (key(keys::SESSION_ID), text(&event.session_id)),
        (key(keys::METADATA), metadata),
        (key(keys::PREVIOUS_HASH), text(&event.previous_hash)),
    ])
}

/// Map a JSON value onto the CBOR data model.
///
/// Non-negative integers become major type 0, negative integers major
/// type 1, everything else numeric becomes a double.
fn json_to_cbor_value(value: &Json) -> Value {
    match value {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(u) = n.as_u64() {
                Value::Integer(u.into())
            } else if let Some(i) = n.as_i64() {
                Value::Integer(i.into())
            } else {
                n.as_f64().map(Value::Float).unwrap_or(Value::Null)
            }
        }
        Json::String(s) => Value::Text(s.clone()),
        Json::Array(items) => Value::Array(items.iter().map(json_to_cbor_value).collect()),
        Json::Object(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (Value::Text(k.clone()), json_to_cbor_value(v)))
                .collect(),
        ),
    }
}

/// Encode a CBOR value to canonical bytes.
fn encode_canonical(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Value::Text(s) => {
            encode_uint(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Array(arr) => {
            encode_uint(buf, 4, arr.len() as u64);
            for item in arr {
                encode_value_to(buf, item);
            }
        }
        Value::Map(entries) => encode_map_canonical(buf, entries),
        Value::Tag(tag, inner) => {
            encode_uint(buf, 6, *tag);
            encode_value_to(buf, inner);
        }
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(f) => {
            buf.push(0xfb);
            buf.extend_from_slice(&f.to_bits().to_be_bytes());
        }
        // Only the variants above are ever produced by this module.
        _ => unreachable!("unsupported CBOR value in canonical encoding"),
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| (encode_canonical(k), v))
        .collect();

    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}
