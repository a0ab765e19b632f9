//! Read-through accessor over the secret store.
//!
//! Secrets are fetched fresh on every call; they may rotate at any time, so
//! nothing here is cached.

use async_trait::async_trait;
use log::*;

use crate::error::{AuthErrorKind, Error, ExternalErrorKind};

/// Read access to named secret records.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the string payload of a secret by id. Returns an empty string
    /// when the secret exists but holds no string value.
    async fn get_secret(&self, id: &str) -> Result<String, Error>;
}

/// `SecretStore` backed by AWS Secrets Manager.
pub struct SecretsManagerStore {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerStore {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_secretsmanager::Client::new(config),
        }
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn get_secret(&self, id: &str) -> Result<String, Error> {
        debug!("Fetching secret {id}");

        let output = self
            .client
            .get_secret_value()
            .secret_id(id)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to fetch secret {id}: {e:?}");
                Error {
                    source: Some(Box::new(e)),
                    error_kind: AuthErrorKind::External(ExternalErrorKind::Provider),
                }
            })?;

        Ok(output.secret_string.unwrap_or_default())
    }
}
