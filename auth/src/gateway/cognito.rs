//! Cognito hosted-UI OAuth client.
//!
//! Performs the back-channel authorization-code-grant exchange against the
//! user pool's token endpoint. Codes are single-use and expire within
//! minutes, so a failed exchange is never retried.

use log::*;
use serde::{Deserialize, Serialize};

use crate::error::{AuthErrorKind, Error, ExternalErrorKind};

/// Client id and secret for a user-pool client, as stored in the secret
/// record `{site}/cognito/user-pool/client-secret`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPoolClientSecret {
    pub client_id: String,
    pub client_secret: String,
}

/// Form body for the authorization-code-grant exchange.
#[derive(Debug, Serialize)]
struct TokenExchangeRequest {
    grant_type: String,
    client_id: String,
    code: String,
    redirect_uri: String,
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
pub struct TokenExchangeResponse {
    pub access_token: String,
    pub id_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: i64,
}

/// Client for the user pool's `/oauth2/token` endpoint.
pub struct CognitoOAuthClient {
    client: reqwest::Client,
}

impl CognitoOAuthClient {
    pub fn new() -> Result<Self, Error> {
        let client = reqwest::Client::builder().use_rustls_tls().build()?;
        Ok(Self { client })
    }

    /// Exchange an authorization code for tokens.
    ///
    /// Issues a form-encoded POST to `{user_pool_domain}/oauth2/token`,
    /// authenticated with HTTP Basic auth built from the client credentials.
    pub async fn exchange_code(
        &self,
        user_pool_domain: &str,
        credentials: &UserPoolClientSecret,
        redirect_uri: &str,
        code: &str,
    ) -> Result<TokenExchangeResponse, Error> {
        let request = TokenExchangeRequest {
            grant_type: "authorization_code".to_string(),
            client_id: credentials.client_id.clone(),
            code: code.to_string(),
            redirect_uri: redirect_uri.to_string(),
        };

        let url = format!("{user_pool_domain}/oauth2/token");
        debug!("Exchanging authorization code at {url}");

        let response = self
            .client
            .post(&url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to reach token endpoint: {e:?}");
                Error {
                    source: Some(Box::new(e)),
                    error_kind: AuthErrorKind::External(ExternalErrorKind::Network),
                }
            })?;

        if response.status().is_success() {
            let tokens: TokenExchangeResponse = response.json().await.map_err(|e| {
                warn!("Failed to parse token endpoint response: {e:?}");
                Error {
                    source: Some(Box::new(e)),
                    error_kind: AuthErrorKind::External(ExternalErrorKind::InvalidResponse),
                }
            })?;
            info!("Authorization code exchanged for tokens");
            Ok(tokens)
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!("Token endpoint returned {status}: {error_text}");
            Err(Error {
                source: None,
                error_kind: AuthErrorKind::External(ExternalErrorKind::TokenExchange),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> UserPoolClientSecret {
        UserPoolClientSecret {
            client_id: "client-abc".to_string(),
            client_secret: "s3cret".to_string(),
        }
    }

    // base64("client-abc:s3cret")
    const EXPECTED_BASIC_AUTH: &str = "Basic Y2xpZW50LWFiYzpzM2NyZXQ=";

    #[tokio::test]
    async fn test_exchange_code_posts_form_with_basic_auth() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth2/token")
            .match_header("authorization", EXPECTED_BASIC_AUTH)
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
                mockito::Matcher::UrlEncoded("client_id".into(), "client-abc".into()),
                mockito::Matcher::UrlEncoded("code".into(), "ABC123".into()),
                mockito::Matcher::UrlEncoded(
                    "redirect_uri".into(),
                    "https://site.example.com/callback".into(),
                ),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "access_token": "access",
                    "id_token": "identity",
                    "refresh_token": "refresh",
                    "token_type": "Bearer",
                    "expires_in": 3600
                }"#,
            )
            .create_async()
            .await;

        let client = CognitoOAuthClient::new().unwrap();
        let tokens = client
            .exchange_code(
                &server.url(),
                &credentials(),
                "https://site.example.com/callback",
                "ABC123",
            )
            .await
            .unwrap();

        assert_eq!(tokens.id_token, "identity");
        assert_eq!(tokens.token_type, "Bearer");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_exchange_code_maps_http_error_to_token_exchange_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/oauth2/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let client = CognitoOAuthClient::new().unwrap();
        let err = client
            .exchange_code(&server.url(), &credentials(), "https://x/callback", "BAD")
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            AuthErrorKind::External(ExternalErrorKind::TokenExchange)
        );
    }

    #[tokio::test]
    async fn test_exchange_code_rejects_malformed_success_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = CognitoOAuthClient::new().unwrap();
        let err = client
            .exchange_code(&server.url(), &credentials(), "https://x/callback", "ABC")
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            AuthErrorKind::External(ExternalErrorKind::InvalidResponse)
        );
    }
}
