//! Error types for auditchain core.

use thiserror::Error;

/// Errors raised by the pure core components.
///
/// Chain corruption is not an error here: the verifier reports it as data
/// in a [`VerificationReport`](crate::verify::VerificationReport).
#[derive(Debug, Error)]
pub enum CoreError {
    /// A query filter is malformed (unparseable date, inverted range).
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// An event could not be rendered to its textual form.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Encoding(e.to_string())
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
