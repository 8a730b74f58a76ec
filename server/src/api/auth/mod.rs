//! Authentication module

mod identity;
pub mod jwt;
pub mod middleware;

pub use identity::{
    AnonymousIdentity, Caller, IdentityError, IdentityService, JwtIdentity, identity_from_config,
};
pub use middleware::{AuthState, require_auth};
