//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use auditchain::{AuditConfig, AuditTrail};
use auditchain_core::{kinds, EventInput};
use auditchain_store::MemoryStore;

pub const DEMO_ACTOR: &str = "user-admin-1";
pub const DEMO_SESSION: &str = "demo-session-1";
pub const DEMO_IP: &str = "127.0.0.1";
pub const DEMO_USER_AGENT: &str = "Demo Browser";

/// The two events a fresh demo deployment starts with.
pub fn demo_session_inputs() -> Vec<EventInput> {
    let base = |event_type: &str, action: &str| {
        EventInput::new(event_type, action, DEMO_ACTOR)
            .session(DEMO_SESSION)
            .ip_address(DEMO_IP)
            .user_agent(DEMO_USER_AGENT)
    };

    vec![
        base(kinds::SESSION_STARTED, "User session started").detail("sessionType", "demo"),
        base(kinds::PAGE_VISITED, "Visited dashboard").detail("page", "dashboard"),
    ]
}

/// Replace the hex digit at `index` with a different one.
///
/// Returns the input unchanged if `index` is out of range.
pub fn flip_hex_char(hex: &str, index: usize) -> String {
    hex.char_indices()
        .map(|(i, c)| {
            if i != index {
                c
            } else if c == '0' {
                '1'
            } else {
                '0'
            }
        })
        .collect()
}

/// Number of CSV records in `csv`: line breaks inside quoted cells do not
/// end a record.
pub fn csv_record_count(csv: &str) -> usize {
    let mut quoted = false;
    let mut records = 1;
    for c in csv.chars() {
        match c {
            '"' => quoted = !quoted,
            '\n' if !quoted => records += 1,
            _ => {}
        }
    }
    records
}

/// A test fixture with a trail over an unbounded memory store.
pub struct TestFixture {
    pub trail: AuditTrail<MemoryStore>,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_config(AuditConfig::default())
    }

    /// Ignores `config.store`; the backend is always memory.
    pub fn with_config(config: AuditConfig) -> Self {
        Self {
            trail: AuditTrail::new(MemoryStore::new(), config),
        }
    }

    /// Append an event with a generated action and no payload.
    pub async fn log(&self, event_type: &str, actor: &str) -> auditchain_core::AuditEvent {
        let input = EventInput::new(event_type, format!("{event_type} by {actor}"), actor);
        match self.trail.log_event(input).await {
            Ok(event) => event,
            Err(e) => panic!("fixture append failed: {e}"),
        }
    }

    /// Append `n` page visits by `actor`.
    pub async fn log_many(&self, n: usize, actor: &str) {
        for _ in 0..n {
            self.log(kinds::PAGE_VISITED, actor).await;
        }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
