//! Builder for CloudFront-shaped HTTP responses.
//!
//! Used only on redirect-producing paths; pass-through returns the original
//! request and never goes through the builder. Cookie-only and
//! redirect-plus-cookie combinations are both supported, and `build` always
//! yields a response with status, status description and headers populated.

use std::collections::HashMap;

use crate::event::{CloudfrontResponse, HeaderEntry};

/// Attributes stamped on every cookie this layer sets.
pub const SESSION_COOKIE_ATTRIBUTES: &str = "Path=/; Secure; HttpOnly";

pub struct ResponseBuilder {
    status: u16,
    status_description: String,
    headers: HashMap<String, Vec<HeaderEntry>>,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self {
            status: 200,
            status_description: "OK".to_string(),
            headers: HashMap::new(),
        }
    }

    /// Set an explicit status line.
    pub fn status(mut self, status: u16, description: &str) -> Self {
        self.status = status;
        self.status_description = description.to_string();
        self
    }

    /// Turn the response into a 302 redirect to `location`.
    pub fn redirect_to(mut self, location: &str) -> Self {
        self.status = 302;
        self.status_description = "Found".to_string();
        self.headers.insert(
            "location".to_string(),
            vec![HeaderEntry::new("Location", location.to_string())],
        );
        self
    }

    /// Add a `Set-Cookie` header with the default session attributes.
    pub fn set_cookie(mut self, name: &str, value: &str) -> Self {
        self.headers
            .entry("set-cookie".to_string())
            .or_default()
            .push(HeaderEntry::new(
                "Set-Cookie",
                format!("{name}={value}; {SESSION_COOKIE_ATTRIBUTES}"),
            ));
        self
    }

    pub fn build(self) -> CloudfrontResponse {
        CloudfrontResponse {
            status: self.status.to_string(),
            status_description: self.status_description,
            headers: self.headers,
        }
    }
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
