//! Shared API types
//!
//! Every failure leaves the service as `{ "error": message }`. Backend detail
//! is logged here and never reaches the client.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::domain::QueryError;

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { message: String },
    Unauthorized { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        match &e {
            QueryError::Input(message) => {
                tracing::debug!(error = %message, "Rejected query parameters");
                Self::bad_request(message.clone())
            }
            QueryError::BackendValidation(source) => {
                tracing::error!(error = %source, "Backend rejected query");
                Self::bad_request(e.to_string())
            }
            QueryError::BackendUnavailable(source) => {
                tracing::error!(error = %source, "Backend query failed");
                Self::internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::BadRequest { message }
            | Self::Unauthorized { message }
            | Self::NotFound { message }
            | Self::Internal { message } => message,
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataError;

    #[test]
    fn test_query_error_status_mapping() {
        let cases = [
            (QueryError::input("Invalid parameters"), StatusCode::BAD_REQUEST),
            (
                DataError::validation("timestream", "bad column").into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                DataError::unavailable("dynamodb", "throttled").into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                DataError::Timeout {
                    backend: "dynamodb",
                    timeout_secs: 10,
                }
                .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[tokio::test]
    async fn test_backend_detail_not_exposed() {
        let err: QueryError = DataError::unavailable("dynamodb", "secret-host:8000 refused").into();
        let response = ApiError::from(err).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Storage backend unavailable" }));
    }
}
