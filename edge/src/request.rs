//! Viewer-request inspection: cookies, requested URL, redirect state.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::{CallbackErrorKind, EdgeErrorKind, Error};
use crate::event::CloudfrontRequest;

/// Name of the session cookie carrying the identity token.
pub const ID_TOKEN_COOKIE: &str = "idToken";

/// Parse all `Cookie` headers into name/value pairs.
pub fn extract_cookies(request: &CloudfrontRequest) -> HashMap<String, String> {
    let mut cookies = HashMap::new();

    if let Some(entries) = request.headers.get("cookie") {
        for entry in entries {
            for pair in entry.value.split(';') {
                if let Some((name, value)) = pair.split_once('=') {
                    cookies.insert(name.trim().to_string(), value.trim().to_string());
                }
            }
        }
    }

    cookies
}

/// The URL the viewer asked for: path plus query string when present.
pub fn requested_url(request: &CloudfrontRequest) -> String {
    if request.querystring.is_empty() {
        request.uri.clone()
    } else {
        format!("{}?{}", request.uri, request.querystring)
    }
}

/// Look up a query parameter by name, percent-decoded.
pub fn query_param(request: &CloudfrontRequest, name: &str) -> Option<String> {
    request
        .querystring
        .split('&')
        .filter(|pair| !pair.is_empty())
        .find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if key != name {
                return None;
            }
            Some(
                urlencoding::decode(value)
                    .map(|decoded| decoded.into_owned())
                    .unwrap_or_else(|_| value.to_string()),
            )
        })
}

/// Append a query parameter to a URL, percent-encoding the value.
pub fn append_query_param(url: &str, name: &str, value: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{name}={}", urlencoding::encode(value))
}

/// The opaque state blob round-tripped through the login redirect.
///
/// Lives only inside a single browser redirect; encoded when sending the
/// viewer to the login page, decoded exactly once at the callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectState {
    #[serde(rename = "requestedURL")]
    pub requested_url: String,
}

/// Encode the pre-auth destination as `base64(json)`.
pub fn encode_state(requested_url: &str) -> String {
    let json = serde_json::json!({ "requestedURL": requested_url }).to_string();
    BASE64_STANDARD.encode(json)
}

/// Decode a `state` query parameter back into the pre-auth destination.
pub fn decode_state(encoded: &str) -> Result<RedirectState, Error> {
    let bytes = BASE64_STANDARD.decode(encoded).map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: EdgeErrorKind::Callback(CallbackErrorKind::InvalidState),
    })?;

    serde_json::from_slice(&bytes).map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: EdgeErrorKind::Callback(CallbackErrorKind::InvalidState),
    })
}
