//! Request authentication orchestration.
//!
//! [`AuthService`] owns the read-through clients and the two process-wide
//! memoization caches (distribution alias, token verifier). One instance is
//! built per execution environment at cold start and shared by every
//! invocation on the warm path, so the caches survive across requests.

use std::sync::Arc;

use log::*;

use crate::clients::cloudfront::{AliasResolver, CloudfrontDistributionApi, DistributionApi};
use crate::clients::secrets::{SecretStore, SecretsManagerStore};
use crate::clients::ssm::{ParameterStore, SsmParameterStore};
use crate::error::{AuthErrorKind, Error, ExternalErrorKind};
use crate::gateway::cognito::{CognitoOAuthClient, UserPoolClientSecret};
use crate::jwt::{IdTokenClaims, IdTokenVerifier, VerifierCache};

pub struct AuthService {
    parameters: Arc<dyn ParameterStore>,
    secrets: Arc<dyn SecretStore>,
    aliases: AliasResolver,
    oauth: CognitoOAuthClient,
    verifiers: VerifierCache,
    issuer_base: Option<String>,
}

impl AuthService {
    /// Assemble a service from its collaborators. The verifier cache is
    /// injected so its lifetime is an explicit decision of the host process.
    pub fn new(
        parameters: Arc<dyn ParameterStore>,
        secrets: Arc<dyn SecretStore>,
        distributions: Arc<dyn DistributionApi>,
        verifiers: VerifierCache,
    ) -> Result<Self, Error> {
        Ok(Self {
            parameters,
            secrets,
            aliases: AliasResolver::new(distributions),
            oauth: CognitoOAuthClient::new()?,
            verifiers,
            issuer_base: None,
        })
    }

    /// Build a service backed by the AWS SDK clients, pinned to `region`
    /// when given, otherwise using the SDK's default region chain.
    pub async fn for_region(region: Option<String>) -> Result<Self, Error> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let config = loader.load().await;

        Self::new(
            Arc::new(SsmParameterStore::new(&config)),
            Arc::new(SecretsManagerStore::new(&config)),
            Arc::new(CloudfrontDistributionApi::new(&config)),
            VerifierCache::new(),
        )
    }

    /// Override the base URL token issuers are derived from.
    /// Tests point this at a mock server; production derives the Cognito
    /// issuer from the user pool id.
    pub fn with_issuer_base(mut self, issuer_base: String) -> Self {
        self.issuer_base = Some(issuer_base);
        self
    }

    /// Hostname the parameter namespace is keyed by for this distribution.
    async fn site(&self, distribution_id: &str) -> Result<String, Error> {
        self.aliases.resolve(distribution_id).await
    }

    async fn verifier(&self, distribution_id: &str) -> Result<Arc<IdTokenVerifier>, Error> {
        if let Some(verifier) = self.verifiers.get(distribution_id).await {
            return Ok(verifier);
        }

        let site = self.site(distribution_id).await?;
        let user_pool_id = self
            .parameters
            .get_parameter(&format!("/{site}/cognito/user-pool-id"), false)
            .await?;
        let client_id = self
            .parameters
            .get_parameter(&format!("/{site}/cognito/client-id"), false)
            .await?;

        let verifier = Arc::new(match &self.issuer_base {
            Some(base) => IdTokenVerifier::with_issuer(&client_id, format!("{base}/{user_pool_id}"))?,
            None => IdTokenVerifier::new(&user_pool_id, &client_id)?,
        });

        info!("Built token verifier for distribution {distribution_id}");
        self.verifiers.insert(distribution_id, verifier.clone()).await;
        Ok(verifier)
    }

    /// Validate the identity token presented for a distribution.
    ///
    /// Any verification failure is reported as unauthorized; the caller's
    /// only recovery is a redirect to the login page.
    pub async fn authenticate(
        &self,
        distribution_id: &str,
        id_token: &str,
    ) -> Result<IdTokenClaims, Error> {
        let verifier = self.verifier(distribution_id).await?;
        verifier.verify(id_token).await
    }

    /// Hosted login page URL for the distribution's site.
    pub async fn login_page_url(&self, distribution_id: &str) -> Result<String, Error> {
        let site = self.site(distribution_id).await?;
        self.parameters
            .get_parameter(&format!("/{site}/cognito/login-url"), false)
            .await
    }

    /// Exchange an authorization code for an identity token.
    ///
    /// The client secret, user-pool domain and redirect URI are independent
    /// reads and are fetched concurrently. The secret is fetched fresh on
    /// every exchange since it may rotate.
    pub async fn exchange_code(&self, distribution_id: &str, code: &str) -> Result<String, Error> {
        let site = self.site(distribution_id).await?;

        let secret_name = format!("{site}/cognito/user-pool/client-secret");
        let domain_name = format!("/{site}/cognito/user-pool/domain");
        let redirect_uri_name = format!("/{site}/cognito/user-pool/client/redirect-uri");
        let (secret_string, user_pool_domain, redirect_uri) = tokio::try_join!(
            self.secrets.get_secret(&secret_name),
            self.parameters.get_parameter(&domain_name, false),
            self.parameters.get_parameter(&redirect_uri_name, false),
        )?;

        let credentials: UserPoolClientSecret =
            serde_json::from_str(&secret_string).map_err(|e| {
                warn!("Client secret record is not valid JSON");
                Error {
                    source: Some(Box::new(e)),
                    error_kind: AuthErrorKind::External(ExternalErrorKind::MalformedSecret),
                }
            })?;

        let tokens = self
            .oauth
            .exchange_code(&user_pool_domain, &credentials, &redirect_uri, code)
            .await?;

        // Only the identity token is retained; the rest of the grant is
        // deliberately discarded.
        Ok(tokens.id_token)
    }
}
