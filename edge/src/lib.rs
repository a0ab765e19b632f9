//! # edge
//!
//! The viewer-facing layer: CloudFront event and response shapes, request
//! inspection (cookies, requested URL, redirect state), the response
//! builder, and the two handler entry points that gate the distribution and
//! complete the login callback.
//!
//! Handlers never propagate errors to the platform; every internal failure
//! is converted into a well-formed response at the handler boundary.

pub mod context;
pub mod error;
pub mod event;
pub mod handlers;
pub mod request;
pub mod response;

pub use error::{EdgeErrorKind, Error};
