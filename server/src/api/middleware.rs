//! HTTP middleware (CORS, 404 handler)

use anyhow::{Context, Result};
use axum::extract::Request;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::types::ApiError;

const ANY_ORIGIN: &str = "*";

/// Create CORS layer for the configured origin (`*` allows any)
pub fn cors(allow_origin: &str) -> Result<CorsLayer> {
    let origin = if allow_origin == ANY_ORIGIN {
        AllowOrigin::any()
    } else {
        let value: HeaderValue = allow_origin
            .parse()
            .with_context(|| format!("Invalid CORS origin: {allow_origin}"))?;
        AllowOrigin::exact(value)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::OPTIONS, Method::GET])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

/// Handle 404 Not Found with logging
pub async fn handle_404(req: Request) -> ApiError {
    tracing::debug!(method = %req.method(), uri = %req.uri(), "[404]");
    ApiError::not_found("Not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_accepts_any_and_exact() {
        assert!(cors("*").is_ok());
        assert!(cors("https://dashboard.example.com").is_ok());
    }

    #[test]
    fn test_cors_rejects_invalid_origin() {
        assert!(cors("bad\norigin").is_err());
    }
}
