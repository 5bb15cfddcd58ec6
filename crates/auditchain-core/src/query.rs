//! Query/filter engine.
//!
//! Results are ordered newest first (descending `sequence`). This differs on
//! purpose from [`TimeRange`](crate::stats::TimeRange), which reports the
//! earliest instant as `first` and the latest as `last`.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::event::AuditEvent;
use crate::stats::Stats;

/// Constraints on which events a query returns. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    /// Substring of the actor identifier.
    pub actor: Option<String>,
    /// Exact event type.
    pub event_type: Option<String>,
    /// Exact document identifier.
    pub document_id: Option<String>,
    /// Inclusive lower bound.
    pub start_time: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub end_time: Option<DateTime<Utc>>,
}

impl QueryFilter {
    /// A filter that matches every event.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    pub fn since(mut self, start: DateTime<Utc>) -> Self {
        self.start_time = Some(start);
        self
    }

    pub fn until(mut self, end: DateTime<Utc>) -> Self {
        self.end_time = Some(end);
        self
    }

    /// Build a filter from string parameters, as received from a query string.
    ///
    /// Recognised keys: `actor` (alias `userId`), `eventType`, `documentId`,
    /// `startDate`/`startTime`, `endDate`/`endTime`. Other keys are ignored
    /// and empty values count as unset. Instants are RFC 3339 or bare
    /// `YYYY-MM-DD` dates; a bare end date covers the whole day.
    pub fn from_params<I, K, V>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filter = Self::default();

        for (key, value) in params {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }

            match key.as_ref() {
                "actor" | "userId" => filter.actor = Some(value.to_string()),
                "eventType" => filter.event_type = Some(value.to_string()),
                "documentId" => filter.document_id = Some(value.to_string()),
                "startDate" | "startTime" => {
                    filter.start_time = Some(parse_instant(value, Bound::Start)?)
                }
                "endDate" | "endTime" => filter.end_time = Some(parse_instant(value, Bound::End)?),
                _ => {}
            }
        }

        filter.validate()?;
        Ok(filter)
    }

    /// Reject filters that can never match because the range is inverted.
    pub fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if start > end {
                return Err(CoreError::InvalidFilter(format!(
                    "start time {} is after end time {}",
                    start.to_rfc3339(),
                    end.to_rfc3339()
                )));
            }
        }
        Ok(())
    }

    /// True if the event satisfies every set constraint.
    pub fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(actor) = &self.actor {
            if !event.actor.contains(actor.as_str()) {
                return false;
            }
        }
        if let Some(event_type) = &self.event_type {
            if &event.event_type != event_type {
                return false;
            }
        }
        if let Some(document_id) = &self.document_id {
            if event.document_id.as_ref() != Some(document_id) {
                return false;
            }
        }
        if let Some(start) = self.start_time {
            if event.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end_time {
            if event.timestamp > end {
                return false;
            }
        }
        true
    }

    /// Filter a log and order the survivors newest first.
    pub fn apply(&self, events: Vec<AuditEvent>) -> Result<Vec<AuditEvent>> {
        self.validate()?;

        let mut selected: Vec<AuditEvent> =
            events.into_iter().filter(|e| self.matches(e)).collect();
        selected.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        Ok(selected)
    }
}

/// Events selected by a query plus statistics for the whole log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Matching events, newest first.
    pub events: Vec<AuditEvent>,
    /// Log-wide statistics.
    pub stats: Stats,
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

fn parse_instant(value: &str, bound: Bound) -> Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| CoreError::InvalidFilter(format!("unparseable date: {value:?}")))?;

    let time = match bound {
        Bound::Start => NaiveTime::MIN,
        Bound::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
            .ok_or_else(|| CoreError::InvalidFilter("end of day out of range".into()))?,
    };

    Ok(Utc.from_utc_datetime(&date.and_time(time)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventInput;

    fn event(sequence: u64, event_type: &str, actor: &str, doc: Option<&str>, ms: i64) -> AuditEvent {
        let mut input = EventInput::new(event_type, "action", actor);
        if let Some(d) = doc {
            input = input.document(d);
        }
        let ts = Utc.timestamp_millis_opt(ms).unwrap();
        AuditEvent::seal(input, format!("id-{sequence}"), sequence, ts, "")
    }

    fn log() -> Vec<AuditEvent> {
        vec![
            event(1, "session_started", "user-admin-1", None, 1_000),
            event(2, "upload_completed", "user-admin-1", Some("d1"), 2_000),
            event(3, "upload_completed", "user-reviewer-2", Some("d2"), 3_000),
            event(4, "download_requested", "user-reviewer-2", Some("d1"), 4_000),
        ]
    }

    #[test]
    fn test_empty_filter_returns_all_newest_first() {
        let result = QueryFilter::all().apply(log()).unwrap();
        let seqs: Vec<u64> = result.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_event_type_exact() {
        let result = QueryFilter::all()
            .event_type("upload_completed")
            .apply(log())
            .unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|e| e.event_type == "upload_completed"));

        let none = QueryFilter::all().event_type("upload").apply(log()).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_actor_substring() {
        let result = QueryFilter::all().actor("reviewer").apply(log()).unwrap();
        let seqs: Vec<u64> = result.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![4, 3]);
    }

    #[test]
    fn test_document_exact() {
        let result = QueryFilter::all().document("d1").apply(log()).unwrap();
        let seqs: Vec<u64> = result.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![4, 2]);
    }

    #[test]
    fn test_time_range_inclusive() {
        let filter = QueryFilter::all()
            .since(Utc.timestamp_millis_opt(2_000).unwrap())
            .until(Utc.timestamp_millis_opt(3_000).unwrap());
        let seqs: Vec<u64> = filter.apply(log()).unwrap().iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![3, 2]);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let filter = QueryFilter::all()
            .since(Utc.timestamp_millis_opt(5_000).unwrap())
            .until(Utc.timestamp_millis_opt(1_000).unwrap());
        assert!(matches!(filter.apply(log()), Err(CoreError::InvalidFilter(_))));
    }

    #[test]
    fn test_from_params() {
        let filter = QueryFilter::from_params([
            ("userId", "admin"),
            ("eventType", "upload_completed"),
            ("documentId", ""),
            ("startDate", "2025-01-01"),
            ("endDate", "2025-01-31"),
            ("userRole", "admin"),
        ])
        .unwrap();

        assert_eq!(filter.actor.as_deref(), Some("admin"));
        assert_eq!(filter.event_type.as_deref(), Some("upload_completed"));
        assert_eq!(filter.document_id, None);
        assert_eq!(
            filter.start_time.unwrap().to_rfc3339(),
            "2025-01-01T00:00:00+00:00"
        );
        assert_eq!(
            filter.end_time.unwrap().timestamp_millis(),
            Utc.with_ymd_and_hms(2025, 1, 31, 23, 59, 59).unwrap().timestamp_millis() + 999
        );
    }

    #[test]
    fn test_from_params_rfc3339() {
        let filter =
            QueryFilter::from_params([("startTime", "2025-03-01T10:00:00+02:00")]).unwrap();
        assert_eq!(
            filter.start_time,
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_from_params_malformed() {
        let err = QueryFilter::from_params([("startDate", "yesterday")]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidFilter(_)));

        let err = QueryFilter::from_params([("startDate", "2025-02-01"), ("endDate", "2025-01-01")])
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidFilter(_)));
    }
}
