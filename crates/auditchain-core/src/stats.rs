//! Statistics aggregation over a log.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::AuditEvent;
use crate::kinds;

/// Event types that count as a processed document.
///
/// An explicit finite set; membership is exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentMarkers(BTreeSet<String>);

impl DocumentMarkers {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(markers.into_iter().map(Into::into).collect())
    }

    /// Parse a comma-separated list, ignoring blanks.
    pub fn parse_list(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty()),
        )
    }

    pub fn contains(&self, event_type: &str) -> bool {
        self.0.contains(event_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for DocumentMarkers {
    fn default() -> Self {
        Self::new([kinds::UPLOAD_COMPLETED, kinds::MASKING_SUCCEEDED])
    }
}

/// Earliest and latest timestamps seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
}

/// Aggregate counters for a set of events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_events: u64,
    pub event_type_counts: BTreeMap<String, u64>,
    pub actor_counts: BTreeMap<String, u64>,
    pub documents_processed: u64,
    /// `None` for an empty log.
    pub time_range: Option<TimeRange>,
}

impl Stats {
    /// Aggregate over `events` in any order.
    pub fn from_events<'a, I>(events: I, markers: &DocumentMarkers) -> Self
    where
        I: IntoIterator<Item = &'a AuditEvent>,
    {
        let mut stats = Self::default();

        for event in events {
            stats.total_events += 1;
            *stats
                .event_type_counts
                .entry(event.event_type.clone())
                .or_insert(0) += 1;
            *stats.actor_counts.entry(event.actor.clone()).or_insert(0) += 1;

            if markers.contains(&event.event_type) {
                stats.documents_processed += 1;
            }

            stats.time_range = Some(match stats.time_range {
                None => TimeRange {
                    first: event.timestamp,
                    last: event.timestamp,
                },
                Some(range) => TimeRange {
                    first: range.first.min(event.timestamp),
                    last: range.last.max(event.timestamp),
                },
            });
        }

        stats
    }

    /// Count for one event type, zero if never seen.
    pub fn event_type_count(&self, event_type: &str) -> u64 {
        self.event_type_counts.get(event_type).copied().unwrap_or(0)
    }
}
