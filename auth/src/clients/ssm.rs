//! Read-through accessor over the SSM Parameter Store.
//!
//! No caching happens at this layer; the caller decides what is safe to
//! cache. Parameter names follow the `/{site}/cognito/...` namespace.

use async_trait::async_trait;
use log::*;

use crate::error::{AuthErrorKind, Error, ExternalErrorKind};

/// Read access to a hierarchical parameter namespace.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetch a parameter value by name, optionally decrypting SecureString
    /// values. Returns an empty string when the parameter has no value.
    async fn get_parameter(&self, name: &str, with_decryption: bool) -> Result<String, Error>;
}

/// `ParameterStore` backed by the AWS SSM Parameter Store.
pub struct SsmParameterStore {
    client: aws_sdk_ssm::Client,
}

impl SsmParameterStore {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_ssm::Client::new(config),
        }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get_parameter(&self, name: &str, with_decryption: bool) -> Result<String, Error> {
        debug!("Fetching parameter {name}");

        let output = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(with_decryption)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to fetch parameter {name}: {e:?}");
                Error {
                    source: Some(Box::new(e)),
                    error_kind: AuthErrorKind::External(ExternalErrorKind::Provider),
                }
            })?;

        Ok(output
            .parameter
            .and_then(|parameter| parameter.value)
            .unwrap_or_default())
    }
}
