//! # auth
//!
//! Domain layer for the edge authentication flow:
//! - read-through clients for the parameter store, secret store and CDN API
//! - identity-token verification against the user pool's published key set
//! - OAuth 2.0 authorization-code exchange against the Cognito hosted UI
//! - the [`service::AuthService`] orchestrator that ties these together
//!
//! The `edge` crate builds its two viewer-request handlers on top of this
//! crate; nothing here knows about the CloudFront event shape.

pub mod clients;
pub mod error;
pub mod gateway;
pub mod jwt;
pub mod service;

#[cfg(any(test, feature = "mock"))]
pub mod test_support;

// Re-export commonly used types
pub use error::{AuthErrorKind, Error};
