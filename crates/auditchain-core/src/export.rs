//! CSV rendering of audit events.
//!
//! Free-text columns (`Action`, `Details`, `IP Address`, `User Agent`) are
//! always quoted with embedded quotes doubled. Identifier and numeric columns
//! are written bare and only quoted if they would otherwise break the row.
//! Rows are joined with `\n` and there is no trailing newline. A quoted cell
//! may itself contain line breaks, so an export holds one header plus one
//! record per event, not necessarily that many lines.

use chrono::{NaiveDate, SecondsFormat};

use crate::error::Result;
use crate::event::AuditEvent;

/// Column labels, in output order.
pub const CSV_HEADER: [&str; 11] = [
    "Timestamp",
    "Sequence",
    "Event Type",
    "Action",
    "Actor",
    "Document ID",
    "Details",
    "Session ID",
    "Hash",
    "IP Address",
    "User Agent",
];

/// Render events in the order given, header first.
pub fn render_csv<'a, I>(events: I) -> Result<String>
where
    I: IntoIterator<Item = &'a AuditEvent>,
{
    let mut rows = vec![CSV_HEADER.join(",")];
    for event in events {
        rows.push(render_row(event)?);
    }
    Ok(rows.join("\n"))
}

/// Download name for an export produced on `date`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("audit-log-{}.csv", date.format("%Y-%m-%d"))
}

fn render_row(event: &AuditEvent) -> Result<String> {
    let details = serde_json::to_string(&event.details)?;

    let cells = [
        bare(&event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        event.sequence.to_string(),
        bare(&event.event_type),
        quoted(&event.action),
        bare(&event.actor),
        bare(event.document_id.as_deref().unwrap_or("")),
        quoted(&details),
        bare(&event.session_id),
        bare(&event.hash),
        quoted(&event.metadata.ip_address),
        quoted(&event.metadata.user_agent),
    ];

    Ok(cells.join(","))
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn bare(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        quoted(value)
    } else {
        value.to_string()
    }
}
