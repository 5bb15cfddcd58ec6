//! Integrity verification of a stored log.
//!
//! Verification walks events in ascending sequence order and checks, for
//! every event:
//!
//! 1. **Digest**: the stored `hash` equals a recomputation from stored fields.
//! 2. **Contiguity**: `sequence == predecessor.sequence + 1`.
//! 3. **Linkage**: `previous_hash == predecessor.hash`.
//!
//! The first event is checked against the genesis rules instead of a
//! predecessor: sequence 1 with an empty previous hash, or, after bounded
//! retention, the position and hash recorded in the [`RetentionAnchor`].
//!
//! A corrupt log is a result, not an error. Nothing here mutates state.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::event::AuditEvent;
use crate::hash::GENESIS_PREVIOUS_HASH;
use crate::types::RetentionAnchor;

/// What kind of violation an [`Issue`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Sequence does not follow the predecessor's.
    SequenceGap,
    /// `previous_hash` does not match the predecessor's `hash`.
    BrokenLink,
    /// Stored `hash` differs from the recomputed digest.
    DigestMismatch,
    /// First event does not start where the log (or its anchor) says it should.
    GenesisMismatch,
}

impl IssueKind {
    /// Human-readable label carried in [`Issue::issue`].
    pub fn label(self) -> &'static str {
        match self {
            IssueKind::SequenceGap => "Sequence gap detected",
            IssueKind::BrokenLink | IssueKind::DigestMismatch => "Hash chain broken",
            IssueKind::GenesisMismatch => "Genesis mismatch",
        }
    }
}

/// One detected violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Sequence of the offending event.
    pub sequence: u64,
    pub kind: IssueKind,
    /// Label for display.
    pub issue: String,
    pub expected: String,
    pub actual: String,
}

impl Issue {
    fn new(sequence: u64, kind: IssueKind, expected: impl ToString, actual: impl ToString) -> Self {
        Self {
            sequence,
            kind,
            issue: kind.label().to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Outcome of [`verify_chain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    /// True iff `issues` is empty.
    pub is_valid: bool,
    pub issues: Vec<Issue>,
    pub total_events: u64,
    /// Present when bounded retention has dropped older events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<RetentionAnchor>,
}

impl VerificationReport {
    /// `Ok(self)` for a valid chain, otherwise the issues.
    pub fn into_result(self) -> Result<Self, Vec<Issue>> {
        if self.is_valid {
            Ok(self)
        } else {
            Err(self.issues)
        }
    }
}

/// Verify a log given in ascending sequence order.
pub fn verify_chain(events: &[AuditEvent], anchor: Option<&RetentionAnchor>) -> VerificationReport {
    let mut issues = Vec::new();

    let (first_sequence, first_previous) = match anchor {
        Some(a) => (a.first_sequence, a.previous_hash.as_str()),
        None => (1, GENESIS_PREVIOUS_HASH),
    };

    let mut predecessor: Option<&AuditEvent> = None;

    for event in events {
        match predecessor {
            None => {
                if event.sequence != first_sequence {
                    issues.push(Issue::new(
                        event.sequence,
                        IssueKind::GenesisMismatch,
                        first_sequence,
                        event.sequence,
                    ));
                }
                if event.previous_hash != first_previous {
                    issues.push(Issue::new(
                        event.sequence,
                        IssueKind::GenesisMismatch,
                        first_previous,
                        &event.previous_hash,
                    ));
                }
            }
            Some(prev) => {
                let expected = prev.sequence + 1;
                if event.sequence != expected {
                    issues.push(Issue::new(
                        event.sequence,
                        IssueKind::SequenceGap,
                        expected,
                        event.sequence,
                    ));
                }
                if event.previous_hash != prev.hash {
                    issues.push(Issue::new(
                        event.sequence,
                        IssueKind::BrokenLink,
                        &prev.hash,
                        &event.previous_hash,
                    ));
                }
            }
        }

        let recomputed = event.compute_hash().to_hex();
        if recomputed != event.hash {
            issues.push(Issue::new(
                event.sequence,
                IssueKind::DigestMismatch,
                recomputed,
                &event.hash,
            ));
        }

        predecessor = Some(event);
    }

    for issue in &issues {
        warn!(
            sequence = issue.sequence,
            kind = ?issue.kind,
            expected = %issue.expected,
            actual = %issue.actual,
            "audit chain issue"
        );
    }

    VerificationReport {
        is_valid: issues.is_empty(),
        issues,
        total_events: events.len() as u64,
        anchor: anchor.cloned(),
    }
}
