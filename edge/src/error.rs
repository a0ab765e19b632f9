//! Error types for the `edge` layer.
//!
//! Wraps the `auth` layer's error kinds and adds the failure modes specific
//! to event decoding and the callback codec. The handler boundary is the
//! only consumer: it logs the kind and cause, then emits a redirect.

use std::error::Error as StdError;
use std::fmt;

use auth::AuthErrorKind;

/// Top-level error type for the `edge` crate.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: EdgeErrorKind,
}

/// Major categories of errors in the `edge` layer.
#[derive(Debug, PartialEq)]
pub enum EdgeErrorKind {
    Event(EventErrorKind),
    Callback(CallbackErrorKind),
    Auth(AuthErrorKind),
}

/// Errors decoding the inbound event.
#[derive(Debug, PartialEq)]
pub enum EventErrorKind {
    /// The event carried no CloudFront record.
    MissingRecord,
    /// The invoked-function ARN did not have the expected segments.
    MalformedFunctionArn,
}

/// Errors completing the login callback.
#[derive(Debug, PartialEq)]
pub enum CallbackErrorKind {
    MissingCode,
    MissingState,
    InvalidState,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            EdgeErrorKind::Event(kind) => write!(f, "event error: {:?}", kind),
            EdgeErrorKind::Callback(kind) => write!(f, "callback error: {:?}", kind),
            EdgeErrorKind::Auth(kind) => write!(f, "auth error: {:?}", kind),
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

// Translate `auth` errors into the `edge` layer, preserving the kind so the
// boundary can branch without reaching into the lower layer.
impl From<auth::Error> for Error {
    fn from(err: auth::Error) -> Self {
        Error {
            source: err.source,
            error_kind: EdgeErrorKind::Auth(err.error_kind),
        }
    }
}

/// Helper function to create event errors.
pub fn event_error(kind: EventErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: EdgeErrorKind::Event(kind),
    }
}

/// Helper function to create callback errors.
pub fn callback_error(kind: CallbackErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: EdgeErrorKind::Callback(kind),
    }
}
