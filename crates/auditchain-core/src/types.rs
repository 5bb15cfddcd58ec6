//! Small shared types: chain heads, retention anchors, clock helpers.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::event::AuditEvent;

/// The newest event of a log, as seen by the sequencer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHead {
    /// Sequence number of the newest event.
    pub sequence: u64,
    /// Stored hash of the newest event.
    pub hash: String,
    /// Timestamp of the newest event.
    pub timestamp: DateTime<Utc>,
}

impl ChainHead {
    /// Head position of `event`.
    pub fn of(event: &AuditEvent) -> Self {
        Self {
            sequence: event.sequence,
            hash: event.hash.clone(),
            timestamp: event.timestamp,
        }
    }
}

/// Marker left behind when bounded retention drops the oldest events.
///
/// The retained events are never rewritten. Instead the anchor records where
/// the retained chain now starts, so the verifier can treat the first
/// retained event as the genesis of what is left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionAnchor {
    /// Sequence number the retained chain starts at.
    pub first_sequence: u64,
    /// Hash of the last dropped event.
    pub previous_hash: String,
    /// Number of events dropped so far.
    pub dropped: u64,
    /// When the most recent truncation happened.
    pub truncated_at: DateTime<Utc>,
}

/// Current UTC time truncated to millisecond precision.
///
/// Every backend stores milliseconds verbatim, so the canonical form and the
/// stored form never disagree.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
