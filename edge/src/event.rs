//! CloudFront viewer-request event and response shapes.
//!
//! Only the fields the authenticator reads are modeled explicitly; anything
//! else on the request is captured in `other` so a passed-through request
//! serializes back byte-for-byte equivalent to what arrived.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{event_error, Error, EventErrorKind};

/// A viewer-request trigger event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudfrontEvent {
    #[serde(rename = "Records")]
    pub records: Vec<CloudfrontRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudfrontRecord {
    pub cf: CloudfrontRecordData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudfrontRecordData {
    pub config: DistributionConfig,
    pub request: CloudfrontRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionConfig {
    pub distribution_id: String,
    #[serde(default)]
    pub distribution_domain_name: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub request_id: String,
}

/// The viewer request itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudfrontRequest {
    #[serde(default)]
    pub client_ip: String,
    /// Header name (lowercased) to entries.
    #[serde(default)]
    pub headers: HashMap<String, Vec<HeaderEntry>>,
    pub method: String,
    #[serde(default)]
    pub querystring: String,
    pub uri: String,
    /// Fields this layer does not interpret (e.g. `body`), carried through
    /// unchanged on pass-through.
    #[serde(flatten)]
    pub other: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(key: &str, value: String) -> Self {
        Self {
            key: Some(key.to_string()),
            value,
        }
    }
}

/// A generated response in the shape CloudFront requires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudfrontResponse {
    pub status: String,
    #[serde(rename = "statusDescription")]
    pub status_description: String,
    #[serde(default)]
    pub headers: HashMap<String, Vec<HeaderEntry>>,
}

/// What a viewer-request handler hands back to the platform: either the
/// original request (pass-through) or a generated response.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CloudfrontResult {
    Request(CloudfrontRequest),
    Response(CloudfrontResponse),
}

impl CloudfrontEvent {
    fn record(&self) -> Result<&CloudfrontRecordData, Error> {
        self.records
            .first()
            .map(|record| &record.cf)
            .ok_or_else(|| event_error(EventErrorKind::MissingRecord, "event has no records"))
    }

    pub fn request(&self) -> Result<&CloudfrontRequest, Error> {
        Ok(&self.record()?.request)
    }

    pub fn distribution_id(&self) -> Result<&str, Error> {
        Ok(self.record()?.config.distribution_id.as_str())
    }
}
