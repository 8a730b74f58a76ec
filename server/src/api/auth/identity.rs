//! Caller identity
//!
//! An [`IdentityService`] turns the `Authorization` header of a request into
//! a [`Caller`]. The query path only needs the subject for logging; no
//! further authorization happens after verification.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use thiserror::Error;

use super::jwt::{JwtError, JwtVerifier};
use crate::core::AuthConfig;
use crate::core::constants::ANONYMOUS_SUBJECT;

const BEARER_PREFIX: &str = "Bearer ";

/// Verified caller attached to request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub subject: String,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self {
            subject: ANONYMOUS_SUBJECT.to_string(),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Authorization header is missing")]
    Missing,
    #[error("Authorization header is not a bearer token")]
    Malformed,
    #[error("Token expired")]
    Expired,
    #[error("Token is invalid")]
    Invalid,
}

#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Verify the raw `Authorization` header value, if any
    async fn verify(&self, authorization: Option<&str>) -> Result<Caller, IdentityError>;
}

/// HS256 bearer token identity
pub struct JwtIdentity {
    verifier: JwtVerifier,
}

impl JwtIdentity {
    pub fn new(secret: &str) -> Self {
        Self {
            verifier: JwtVerifier::new(secret.as_bytes()),
        }
    }
}

#[async_trait]
impl IdentityService for JwtIdentity {
    async fn verify(&self, authorization: Option<&str>) -> Result<Caller, IdentityError> {
        let header = authorization.ok_or(IdentityError::Missing)?;
        let token = header
            .strip_prefix(BEARER_PREFIX)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(IdentityError::Malformed)?;

        let claims = self.verifier.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            match e {
                JwtError::Expired => IdentityError::Expired,
                JwtError::InvalidSignature | JwtError::Invalid(_) => IdentityError::Invalid,
            }
        })?;

        Ok(Caller { subject: claims.sub })
    }
}

/// Accepts every request as the anonymous caller (auth disabled)
pub struct AnonymousIdentity;

#[async_trait]
impl IdentityService for AnonymousIdentity {
    async fn verify(&self, _authorization: Option<&str>) -> Result<Caller, IdentityError> {
        Ok(Caller::anonymous())
    }
}

/// Build the identity service for the configured auth mode
pub fn identity_from_config(config: &AuthConfig) -> Result<Arc<dyn IdentityService>> {
    if !config.enabled {
        tracing::debug!("Authentication disabled, all callers are anonymous");
        return Ok(Arc::new(AnonymousIdentity));
    }
    let secret = config
        .jwt_secret
        .as_deref()
        .ok_or_else(|| anyhow!("JWT secret is required when authentication is enabled"))?;
    Ok(Arc::new(JwtIdentity::new(secret)))
}

#[cfg(test)]
mod tests {
    use super::super::jwt::test_tokens::sign;
    use super::*;

    const SECRET: &str = "identity-secret";

    #[tokio::test]
    async fn test_jwt_identity_accepts_bearer() {
        let identity = JwtIdentity::new(SECRET);
        let header = format!("Bearer {}", sign(SECRET.as_bytes(), "alice", 60));
        let caller = identity.verify(Some(&header)).await.unwrap();
        assert_eq!(caller.subject, "alice");
    }

    #[tokio::test]
    async fn test_jwt_identity_rejections() {
        let identity = JwtIdentity::new(SECRET);
        assert_eq!(identity.verify(None).await, Err(IdentityError::Missing));
        assert_eq!(
            identity.verify(Some("Basic abc")).await,
            Err(IdentityError::Malformed)
        );
        assert_eq!(
            identity.verify(Some("Bearer ")).await,
            Err(IdentityError::Malformed)
        );

        let expired = format!("Bearer {}", sign(SECRET.as_bytes(), "alice", -60));
        assert_eq!(
            identity.verify(Some(&expired)).await,
            Err(IdentityError::Expired)
        );

        let forged = format!("Bearer {}", sign(b"wrong", "alice", 60));
        assert_eq!(
            identity.verify(Some(&forged)).await,
            Err(IdentityError::Invalid)
        );
    }

    #[tokio::test]
    async fn test_anonymous_identity() {
        let caller = AnonymousIdentity.verify(None).await.unwrap();
        assert_eq!(caller, Caller::anonymous());
    }

    #[test]
    fn test_identity_from_config_requires_secret() {
        let config = AuthConfig {
            enabled: true,
            jwt_secret: None,
        };
        assert!(identity_from_config(&config).is_err());

        let config = AuthConfig {
            enabled: false,
            jwt_secret: None,
        };
        assert!(identity_from_config(&config).is_ok());
    }
}
