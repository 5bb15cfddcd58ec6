//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Map, Number, Value};

use auditchain_core::{kinds, AuditEvent, Details, EventInput, GENESIS_PREVIOUS_HASH};
use chrono::{TimeZone, Utc};

/// Generate one of the workflow event types.
pub fn event_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(kinds::SESSION_STARTED),
        Just(kinds::PAGE_VISITED),
        Just(kinds::UPLOAD_COMPLETED),
        Just(kinds::MASKING_SUCCEEDED),
        Just(kinds::ITEM_OVERRIDDEN),
        Just(kinds::DOWNLOAD_COMPLETED),
        Just(kinds::SETTINGS_CHANGED),
    ]
    .prop_map(String::from)
}

/// Generate an actor identifier.
pub fn actor() -> impl Strategy<Value = String> {
    "user-[a-z0-9]{1,8}".prop_map(String::from)
}

/// Generate free text, including characters CSV has to quote.
pub fn text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,\"\n'é-]{0,24}".prop_map(String::from)
}

/// Generate a JSON scalar. Floats are finite.
pub fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        (-1.0e9f64..1.0e9f64)
            .prop_map(|f| Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)),
        text().prop_map(Value::String),
    ]
}

/// Generate a JSON value nested at most `depth` levels.
pub fn json_value(depth: u32) -> impl Strategy<Value = Value> {
    scalar().prop_recursive(depth, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Generate an event payload.
pub fn details() -> impl Strategy<Value = Details> {
    prop::collection::btree_map("[a-zA-Z]{1,10}", json_value(2), 0..6)
        .prop_map(|entries| entries.into_iter().collect::<Map<String, Value>>())
}

/// Generate a caller-supplied event.
pub fn event_input() -> impl Strategy<Value = EventInput> {
    (
        event_type(),
        text(),
        actor(),
        proptest::option::of("doc-[0-9]{1,4}"),
        details(),
        proptest::option::of("session-[a-z0-9]{4}"),
        "(127\\.0\\.0\\.1|10\\.0\\.[0-9]{1,3}\\.[0-9]{1,3})?",
    )
        .prop_map(|(event_type, action, actor, doc, details, session, ip)| {
            let mut input = EventInput::new(event_type, action, actor)
                .details(details)
                .ip_address(ip);
            input.document_id = doc;
            input.session_id = session;
            input
        })
}

/// Seal `inputs` into a valid chain starting at sequence 1.
pub fn chain_from_inputs(inputs: Vec<EventInput>) -> Vec<AuditEvent> {
    let base = 1_700_000_000_000i64;
    let mut events: Vec<AuditEvent> = Vec::with_capacity(inputs.len());

    for (i, input) in inputs.into_iter().enumerate() {
        let sequence = i as u64 + 1;
        let previous = events
            .last()
            .map(|e| e.hash.clone())
            .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string());
        let timestamp = Utc
            .timestamp_millis_opt(base + i as i64 * 1000)
            .single()
            .unwrap_or_default();
        events.push(AuditEvent::seal(
            input,
            format!("event-{sequence}"),
            sequence,
            timestamp,
            previous,
        ));
    }

    events
}

/// Generate a valid chain of up to `max_len` events.
pub fn chain(max_len: usize) -> impl Strategy<Value = Vec<AuditEvent>> {
    prop::collection::vec(event_input(), 0..=max_len).prop_map(chain_from_inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditchain_core::{canonical_json_bytes, verify_chain};

    proptest! {
        #[test]
        fn generated_chains_verify(events in chain(12)) {
            let report = verify_chain(&events, None);
            prop_assert!(report.is_valid, "{:?}", report.issues);
            prop_assert_eq!(report.total_events, events.len() as u64);
        }

        #[test]
        fn details_insertion_order_irrelevant(details in details()) {
            let reversed: Details = details
                .iter()
                .rev()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            prop_assert_eq!(
                canonical_json_bytes(&Value::Object(details)),
                canonical_json_bytes(&Value::Object(reversed))
            );
        }

        #[test]
        fn any_content_edit_is_detected(
            events in chain(8),
            target in any::<prop::sample::Index>(),
            action in text()
        ) {
            prop_assume!(!events.is_empty());
            let mut events = events;
            let i = target.index(events.len());
            prop_assume!(events[i].action != action);
            events[i].action = action;

            let report = verify_chain(&events, None);
            prop_assert!(!report.is_valid);
            prop_assert_eq!(report.issues.len(), 1);
            prop_assert_eq!(report.issues[0].sequence, events[i].sequence);
        }
    }
}
