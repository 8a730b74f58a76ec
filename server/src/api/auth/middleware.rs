//! Authentication middleware

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use super::identity::{IdentityError, IdentityService};
use crate::api::types::ApiError;

/// Shared auth state for middleware
#[derive(Clone)]
pub struct AuthState {
    pub identity: Arc<dyn IdentityService>,
}

/// Authentication middleware
///
/// Injects the verified [`Caller`](super::Caller) into request extensions.
/// Expired tokens get "Token expired"; every other failure gets
/// "Unauthorized".
pub async fn require_auth(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let caller = state
        .identity
        .verify(authorization)
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, "Authentication failed");
            match e {
                IdentityError::Expired => ApiError::unauthorized("Token expired"),
                _ => ApiError::unauthorized("Unauthorized"),
            }
        })?;

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}
