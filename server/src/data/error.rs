//! Unified error type for data layer
//!
//! Both storage tiers map their SDK failures onto [`DataError`] so the query
//! router can decide the response class without knowing which backend failed.

use thiserror::Error;

/// Unified error type for data layer operations
#[derive(Error, Debug)]
pub enum DataError {
    /// Backend rejected the request as invalid (bad query text, unknown column)
    #[error("{backend} rejected the query: {message}")]
    Validation {
        backend: &'static str,
        message: String,
    },

    /// A single page request exceeded its deadline
    #[error("Query timeout after {timeout_secs}s on {backend}")]
    Timeout {
        backend: &'static str,
        timeout_secs: u64,
    },

    /// Connection, throttling or service failure
    #[error("Backend {backend} is not available: {reason}")]
    Unavailable {
        backend: &'static str,
        reason: String,
    },

    /// Backend returned a row that cannot be mapped to a record
    #[error("Malformed row from {backend}: {reason}")]
    MalformedRow {
        backend: &'static str,
        reason: String,
    },

    /// Query was cancelled between pages
    #[error("Query cancelled")]
    Cancelled,
}

impl DataError {
    pub fn validation(backend: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            backend,
            message: message.into(),
        }
    }

    pub fn unavailable(backend: &'static str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            backend,
            reason: reason.into(),
        }
    }

    pub fn malformed(backend: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            backend,
            reason: reason.into(),
        }
    }

    /// True when the backend refused the request itself (client-side fault)
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
