//! Distribution alias resolution, memoized per process.
//!
//! The alias maps a distribution id to the public hostname the parameter
//! namespace is keyed by. A distribution's aliases do not change within the
//! lifetime of a warm execution environment, so the resolver keeps an
//! append-only cache; process restart is the only eviction.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::*;
use tokio::sync::RwLock;

use crate::error::{AuthErrorKind, Error, ExternalErrorKind};

/// Describe access to CDN distributions.
#[async_trait]
pub trait DistributionApi: Send + Sync {
    /// First alias CNAME attached to the distribution, if any.
    async fn first_alias(&self, distribution_id: &str) -> Result<Option<String>, Error>;
}

/// `DistributionApi` backed by the CloudFront describe API.
pub struct CloudfrontDistributionApi {
    client: aws_sdk_cloudfront::Client,
}

impl CloudfrontDistributionApi {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_cloudfront::Client::new(config),
        }
    }
}

#[async_trait]
impl DistributionApi for CloudfrontDistributionApi {
    async fn first_alias(&self, distribution_id: &str) -> Result<Option<String>, Error> {
        debug!("Describing distribution {distribution_id}");

        let output = self
            .client
            .get_distribution()
            .id(distribution_id)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to describe distribution {distribution_id}: {e:?}");
                Error {
                    source: Some(Box::new(e)),
                    error_kind: AuthErrorKind::External(ExternalErrorKind::Provider),
                }
            })?;

        Ok(output
            .distribution
            .and_then(|distribution| distribution.alias_icp_recordals)
            .and_then(|recordals| recordals.into_iter().next())
            .and_then(|recordal| recordal.cname))
    }
}

/// Maps a distribution id to its public hostname, at most one describe call
/// per distinct id per process lifetime.
pub struct AliasResolver {
    api: Arc<dyn DistributionApi>,
    cache: RwLock<HashMap<String, String>>,
}

impl AliasResolver {
    pub fn new(api: Arc<dyn DistributionApi>) -> Self {
        Self {
            api,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the hostname for a distribution id.
    ///
    /// Returns an empty string when the distribution has no alias configured;
    /// that case is not masked, callers see parameter lookups under `//...`
    /// fail downstream. Provider errors propagate and are not cached.
    pub async fn resolve(&self, distribution_id: &str) -> Result<String, Error> {
        if let Some(alias) = self.cache.read().await.get(distribution_id) {
            return Ok(alias.clone());
        }

        let alias = self
            .api
            .first_alias(distribution_id)
            .await?
            .unwrap_or_default();

        // Racing populates of the same key converge to the same value.
        self.cache
            .write()
            .await
            .insert(distribution_id.to_string(), alias.clone());

        Ok(alias)
    }
}
