//! Identity-token verification against the user pool's published key set.
//!
//! A verifier is bound to `{user_pool_id, client_id, token_use: "id"}` and
//! validates signature, issuer, audience, expiry and token use. Every
//! validation failure is reported uniformly as unauthorized; callers only
//! need "reject and redirect to login", never the reason.
//!
//! Key material is fetched lazily from the issuer's JWKS endpoint and cached
//! inside the verifier. Verifiers themselves are memoized per distribution
//! id in a [`VerifierCache`] so warm invocations skip the parameter-store
//! round trips needed to construct one.

use std::collections::HashMap;
use std::sync::Arc;

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use log::*;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::{
    internal_error, unauthorized, AuthErrorKind, Error, ExternalErrorKind, InternalErrorKind,
};

pub use claims::IdTokenClaims;

pub(crate) mod claims;

/// The token-use claim value this verifier accepts.
const ID_TOKEN_USE: &str = "id";

/// Key set document published by the issuer.
#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    n: String,
    e: String,
    #[serde(default)]
    alg: Option<String>,
}

/// Verifies identity tokens issued by a single user-pool client.
#[derive(Debug)]
pub struct IdTokenVerifier {
    client_id: String,
    issuer: String,
    jwks_url: String,
    http_client: reqwest::Client,
    keys: RwLock<HashMap<String, DecodingKey>>,
}

impl IdTokenVerifier {
    /// Create a verifier for a user pool, deriving the issuer URL from the
    /// pool id (`{region}_{suffix}`).
    pub fn new(user_pool_id: &str, client_id: &str) -> Result<Self, Error> {
        let (region, _) = user_pool_id.split_once('_').ok_or_else(|| {
            warn!("User pool id {user_pool_id} has no region prefix");
            internal_error(InternalErrorKind::Config, "malformed user pool id")
        })?;

        Self::with_issuer(
            client_id,
            format!("https://cognito-idp.{region}.amazonaws.com/{user_pool_id}"),
        )
    }

    /// Create a verifier with an explicit issuer URL.
    /// Tests point this at a mock server serving a JWKS document.
    pub fn with_issuer(client_id: &str, issuer: String) -> Result<Self, Error> {
        let http_client = reqwest::Client::builder().use_rustls_tls().build()?;

        Ok(Self {
            client_id: client_id.to_string(),
            jwks_url: format!("{issuer}/.well-known/jwks.json"),
            issuer,
            http_client,
            keys: RwLock::new(HashMap::new()),
        })
    }

    /// Verify an identity token and return its decoded claims.
    ///
    /// Signature, issuer, audience, expiry and token use are all checked;
    /// any failure collapses to `AuthErrorKind::Unauthorized`.
    pub async fn verify(&self, token: &str) -> Result<IdTokenClaims, Error> {
        let header = decode_header(token).map_err(|e| {
            debug!("Token header rejected: {e:?}");
            unauthorized("malformed token header")
        })?;

        let kid = header
            .kid
            .ok_or_else(|| unauthorized("token header has no key id"))?;

        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.client_id.as_str()]);

        let data = decode::<IdTokenClaims>(token, &key, &validation).map_err(|e| {
            debug!("Token rejected: {e:?}");
            unauthorized("invalid identity token")
        })?;

        if data.claims.token_use != ID_TOKEN_USE {
            return Err(unauthorized("token is not an identity token"));
        }

        Ok(data.claims)
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, Error> {
        if let Some(key) = self.keys.read().await.get(kid) {
            return Ok(key.clone());
        }

        self.refresh_keys().await?;

        self.keys
            .read()
            .await
            .get(kid)
            .cloned()
            .ok_or_else(|| unauthorized("token signed by an unknown key"))
    }

    async fn refresh_keys(&self) -> Result<(), Error> {
        debug!("Fetching key set from {}", self.jwks_url);

        let response = self.http_client.get(&self.jwks_url).send().await?;

        if !response.status().is_success() {
            warn!("Key set endpoint returned {}", response.status());
            return Err(Error {
                source: None,
                error_kind: AuthErrorKind::External(ExternalErrorKind::InvalidResponse),
            });
        }

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse key set response: {e:?}");
            Error {
                source: Some(Box::new(e)),
                error_kind: AuthErrorKind::External(ExternalErrorKind::InvalidResponse),
            }
        })?;

        let mut keys = self.keys.write().await;
        for jwk in jwks.keys {
            if jwk.kty != "RSA" {
                continue;
            }
            if let Some(alg) = &jwk.alg {
                if alg != "RS256" {
                    continue;
                }
            }
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys.insert(jwk.kid, key);
                }
                Err(e) => warn!("Skipping unparseable key {}: {e:?}", jwk.kid),
            }
        }

        info!("Cached {} signing keys", keys.len());
        Ok(())
    }
}

/// Process-wide memoization of verifiers, keyed by distribution id.
///
/// Append-only; a race to populate the same key converges to an equivalent
/// verifier, so no population lock is held across the construction await.
#[derive(Default)]
pub struct VerifierCache {
    inner: RwLock<HashMap<String, Arc<IdTokenVerifier>>>,
}

impl VerifierCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, distribution_id: &str) -> Option<Arc<IdTokenVerifier>> {
        self.inner.read().await.get(distribution_id).cloned()
    }

    pub async fn insert(&self, distribution_id: &str, verifier: Arc<IdTokenVerifier>) {
        self.inner
            .write()
            .await
            .insert(distribution_id.to_string(), verifier);
    }
}
