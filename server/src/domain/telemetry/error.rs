//! Query engine errors

use thiserror::Error;

use crate::data::DataError;

/// Failure of one telemetry query
#[derive(Error, Debug)]
pub enum QueryError {
    /// Missing or malformed request parameters
    #[error("{0}")]
    Input(String),

    /// The backend refused the generated query
    #[error("Query rejected by storage backend")]
    BackendValidation(#[source] DataError),

    /// Timeout, connection, throttling or any other backend failure
    #[error("Storage backend unavailable")]
    BackendUnavailable(#[source] DataError),
}

impl QueryError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }
}

impl From<DataError> for QueryError {
    fn from(e: DataError) -> Self {
        if e.is_validation() {
            Self::BackendValidation(e)
        } else {
            Self::BackendUnavailable(e)
        }
    }
}

/// A raw value could not be converted to its metric's type
#[derive(Error, Debug, PartialEq)]
#[error("cannot convert {value:?} for metric '{metric}'")]
pub struct CoercionError {
    pub metric: String,
    pub value: String,
}
