//! Configuration for the audit trail.
//!
//! Every field has a default. [`AuditConfig::from_env`] overrides them from
//! environment variables:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `AUDITCHAIN_STORE` | `memory`, `file` or `sqlite` | `memory` |
//! | `AUDITCHAIN_PATH` | file/sqlite location | `./audit-log.jsonl` / `./audit-log.db` |
//! | `AUDITCHAIN_RETENTION` | memory capacity, `0` = unbounded | `1000` |
//! | `AUDITCHAIN_IO_TIMEOUT_MS` | bound on every backend call | `5000` |
//! | `AUDITCHAIN_DOCUMENT_MARKERS` | comma-separated event types | `upload_completed,masking_succeeded` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use auditchain_core::DocumentMarkers;
use auditchain_store::{StoreConfig, DEFAULT_FILE_PATH, DEFAULT_RETENTION, DEFAULT_SQLITE_PATH};
use tracing::warn;

pub const ENV_STORE: &str = "AUDITCHAIN_STORE";
pub const ENV_PATH: &str = "AUDITCHAIN_PATH";
pub const ENV_RETENTION: &str = "AUDITCHAIN_RETENTION";
pub const ENV_IO_TIMEOUT_MS: &str = "AUDITCHAIN_IO_TIMEOUT_MS";
pub const ENV_DOCUMENT_MARKERS: &str = "AUDITCHAIN_DOCUMENT_MARKERS";

/// Default bound on a single backend call.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_millis(5000);

/// Configuration for an [`AuditTrail`](crate::AuditTrail).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditConfig {
    /// Backend to open.
    pub store: StoreConfig,
    /// Bound on every backend call.
    pub io_timeout: Duration,
    /// Event types counted as processed documents.
    pub document_markers: DocumentMarkers,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            io_timeout: DEFAULT_IO_TIMEOUT,
            document_markers: DocumentMarkers::default(),
        }
    }
}

impl AuditConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// Unparseable values are logged and replaced by the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let path = get(ENV_PATH).map(PathBuf::from);
        let store = match get(ENV_STORE).map(|v| v.to_ascii_lowercase()).as_deref() {
            None | Some("memory") => {
                let retention = parse_or(get(ENV_RETENTION), ENV_RETENTION, DEFAULT_RETENTION);
                StoreConfig::Memory {
                    retention: (retention > 0).then_some(retention),
                }
            }
            Some("file") => StoreConfig::File {
                path: path.unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_PATH)),
            },
            Some("sqlite") => StoreConfig::Sqlite {
                path: path.unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)),
            },
            Some(other) => {
                warn!(
                    variable = ENV_STORE,
                    value = other,
                    "unknown audit store backend, using memory"
                );
                StoreConfig::default()
            }
        };

        let timeout_ms = parse_or(
            get(ENV_IO_TIMEOUT_MS),
            ENV_IO_TIMEOUT_MS,
            DEFAULT_IO_TIMEOUT.as_millis() as u64,
        );

        let document_markers = get(ENV_DOCUMENT_MARKERS)
            .map(|list| DocumentMarkers::parse_list(&list))
            .filter(|markers| !markers.is_empty())
            .unwrap_or_default();

        Self {
            store,
            io_timeout: Duration::from_millis(timeout_ms),
            document_markers,
        }
    }

    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    pub fn with_document_markers(mut self, markers: DocumentMarkers) -> Self {
        self.document_markers = markers;
        self
    }
}

fn parse_or<T: FromStr>(value: Option<String>, name: &str, default: T) -> T {
    match value {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, "unparseable value, using default");
            default
        }),
    }
}
