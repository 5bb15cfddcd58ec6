//! Error types for the audit trail.

use std::time::Duration;

use auditchain_core::{CoreError, Issue};
use auditchain_store::StoreError;
use thiserror::Error;

/// Name of the append operation, the one failure callers must alert on.
pub const APPEND: &str = "append";

/// Errors that can occur during audit trail operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The backend failed while performing `operation`.
    #[error("audit storage unavailable during {operation}: {source}")]
    StorageUnavailable {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    /// The backend did not answer within the configured I/O timeout.
    #[error("audit storage timed out during {operation} after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Malformed query filter.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// A verification report was turned into an error.
    #[error("audit chain corrupted: {} issue(s)", issues.len())]
    ChainCorrupted { issues: Vec<Issue> },

    /// An event could not be rendered for export.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl AuditError {
    /// True for transient storage failures on read paths.
    ///
    /// A failed or timed-out append is never retryable from here: it may
    /// still have landed, and retrying would log the event twice.
    pub fn is_retryable(&self) -> bool {
        match self {
            AuditError::StorageUnavailable { operation, source } => {
                *operation != APPEND && !matches!(source, StoreError::Corrupt(_))
            }
            AuditError::Timeout { operation, .. } => *operation != APPEND,
            _ => false,
        }
    }

    /// The operation a storage failure happened in, if any.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            AuditError::StorageUnavailable { operation, .. }
            | AuditError::Timeout { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}

impl From<CoreError> for AuditError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidFilter(msg) => AuditError::InvalidFilter(msg),
            CoreError::Encoding(msg) => AuditError::Encoding(msg),
        }
    }
}

/// Result type for audit trail operations.
pub type Result<T> = std::result::Result<T, AuditError>;
