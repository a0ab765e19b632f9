//! Error types for the `auth` layer.
//!
//! Modeled as a root `Error` struct holding an error kind tree plus an
//! optional source, so callers can branch on the kind while the original
//! cause stays available for logging at the handler boundary.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for the `auth` crate.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: AuthErrorKind,
}

/// Major categories of errors in the `auth` layer.
#[derive(Debug, PartialEq)]
pub enum AuthErrorKind {
    /// The request carries no usable identity: missing, malformed, expired
    /// or otherwise invalid token. This is expected control flow for
    /// unauthenticated traffic, not a fault.
    Unauthorized,
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Errors originating inside this process.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Config,
    Other(String),
}

/// Errors originating from collaborating services.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    /// The network call itself failed.
    Network,
    /// The parameter store, secret store or CDN API reported an error.
    Provider,
    /// The token endpoint rejected the authorization-code exchange.
    TokenExchange,
    /// The client-secret record did not decode into `{clientId, clientSecret}`.
    MalformedSecret,
    /// A collaborator answered with a body we could not decode.
    InvalidResponse,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            AuthErrorKind::Unauthorized => write!(f, "unauthorized"),
            AuthErrorKind::Internal(kind) => write!(f, "internal error: {:?}", kind),
            AuthErrorKind::External(kind) => write!(f, "external error: {:?}", kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Builder errors occur before any network call is made.
        if err.is_builder() {
            Error {
                source: Some(Box::new(err)),
                error_kind: AuthErrorKind::Internal(InternalErrorKind::Other(
                    "Failed to build reqwest client".to_string(),
                )),
            }
        } else {
            Error {
                source: Some(Box::new(err)),
                error_kind: AuthErrorKind::External(ExternalErrorKind::Network),
            }
        }
    }
}

/// Helper function to create unauthorized errors.
pub fn unauthorized(message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: AuthErrorKind::Unauthorized,
    }
}

/// Helper function to create internal errors.
pub fn internal_error(kind: InternalErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: AuthErrorKind::Internal(kind),
    }
}

/// Helper function to create external errors.
pub fn external_error(kind: ExternalErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: AuthErrorKind::External(kind),
    }
}
