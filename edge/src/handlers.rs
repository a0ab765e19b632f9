//! Viewer-request handlers.
//!
//! Two entry points, one per trigger: [`gate`] fronts every protected
//! request and [`complete_callback`] finishes the login flow. Both are
//! total: every failure inside them is converted into a redirect (or a
//! 503 when even the redirect cannot be built), never surfaced to the
//! platform as an invocation error.

use log::*;

use auth::service::AuthService;

use crate::error::{callback_error, CallbackErrorKind, Error};
use crate::event::{CloudfrontEvent, CloudfrontResponse, CloudfrontResult};
use crate::request::{
    append_query_param, decode_state, encode_state, extract_cookies, query_param, requested_url,
    ID_TOKEN_COOKIE,
};
use crate::response::ResponseBuilder;

/// Admit the request if it carries a valid identity token, otherwise send
/// the viewer to the login page with the destination tucked into `state`.
pub async fn gate(service: &AuthService, event: &CloudfrontEvent) -> CloudfrontResult {
    match authenticate(service, event).await {
        Ok(result) => result,
        Err(err) => {
            debug!("Request not authenticated: {err}");
            match login_redirect(service, event).await {
                Ok(response) => CloudfrontResult::Response(response),
                Err(err) => {
                    error!("Failed to build login redirect: {err}");
                    CloudfrontResult::Response(
                        ResponseBuilder::new().status(503, "Service Unavailable").build(),
                    )
                }
            }
        }
    }
}

async fn authenticate(
    service: &AuthService,
    event: &CloudfrontEvent,
) -> Result<CloudfrontResult, Error> {
    let request = event.request()?;
    let distribution_id = event.distribution_id()?;

    let cookies = extract_cookies(request);
    let token = cookies
        .get(ID_TOKEN_COOKIE)
        .ok_or_else(|| Error::from(auth::error::unauthorized("idToken cookie is missing")))?;

    let claims = service.authenticate(distribution_id, token).await?;
    debug!("Authenticated subject {} for {}", claims.sub, request.uri);

    Ok(CloudfrontResult::Request(request.clone()))
}

async fn login_redirect(
    service: &AuthService,
    event: &CloudfrontEvent,
) -> Result<CloudfrontResponse, Error> {
    let request = event.request()?;
    let distribution_id = event.distribution_id()?;

    let state = encode_state(&requested_url(request));
    let login_url = service.login_page_url(distribution_id).await?;

    Ok(ResponseBuilder::new()
        .redirect_to(&append_query_param(&login_url, "state", &state))
        .build())
}

/// Complete the login flow: exchange the authorization code for an identity
/// token, set the session cookie and send the viewer back where they were
/// headed. On any failure the viewer is redirected to the current request's
/// URL without a cookie, which re-enters the gate and restarts the flow.
pub async fn complete_callback(service: &AuthService, event: &CloudfrontEvent) -> CloudfrontResult {
    match run_callback(service, event).await {
        Ok(response) => CloudfrontResult::Response(response),
        Err(err) => {
            warn!("Login callback failed: {err}");
            let destination = event
                .request()
                .map(requested_url)
                .unwrap_or_else(|_| "/".to_string());
            CloudfrontResult::Response(ResponseBuilder::new().redirect_to(&destination).build())
        }
    }
}

async fn run_callback(
    service: &AuthService,
    event: &CloudfrontEvent,
) -> Result<CloudfrontResponse, Error> {
    let request = event.request()?;
    let distribution_id = event.distribution_id()?;

    let code = query_param(request, "code").ok_or_else(|| {
        callback_error(CallbackErrorKind::MissingCode, "callback has no code parameter")
    })?;
    let state = query_param(request, "state").ok_or_else(|| {
        callback_error(CallbackErrorKind::MissingState, "callback has no state parameter")
    })?;
    let state = decode_state(&state)?;

    let id_token = service.exchange_code(distribution_id, &code).await?;
    info!("Completed login, redirecting to {}", state.requested_url);

    Ok(ResponseBuilder::new()
        .set_cookie(ID_TOKEN_COOKIE, &id_token)
        .redirect_to(&state.requested_url)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use auth::clients::cloudfront::DistributionApi;
    use auth::clients::secrets::SecretStore;
    use auth::clients::ssm::ParameterStore;
    use auth::jwt::VerifierCache;
    use auth::test_support::{jwks_body, sign_id_token, valid_claims, TEST_CLIENT_ID};

    use crate::event::{
        CloudfrontRecord, CloudfrontRecordData, CloudfrontRequest, DistributionConfig, HeaderEntry,
    };

    const DISTRIBUTION_ID: &str = "E1TESTDIST";
    const SITE: &str = "site.example.com";
    const POOL_ID: &str = "us-east-1_TestPool";
    const STATE_DASHBOARD: &str = "eyJyZXF1ZXN0ZWRVUkwiOiIvZGFzaGJvYXJkP3g9MSJ9";

    struct MapParameterStore {
        values: HashMap<String, String>,
    }

    #[async_trait]
    impl ParameterStore for MapParameterStore {
        async fn get_parameter(
            &self,
            name: &str,
            _with_decryption: bool,
        ) -> Result<String, auth::Error> {
            self.values
                .get(name)
                .cloned()
                .ok_or_else(|| auth::error::unauthorized("parameter not found"))
        }
    }

    struct StaticSecretStore {
        value: String,
    }

    #[async_trait]
    impl SecretStore for StaticSecretStore {
        async fn get_secret(&self, _id: &str) -> Result<String, auth::Error> {
            Ok(self.value.clone())
        }
    }

    struct StaticDistributionApi;

    #[async_trait]
    impl DistributionApi for StaticDistributionApi {
        async fn first_alias(&self, _distribution_id: &str) -> Result<Option<String>, auth::Error> {
            Ok(Some(SITE.to_string()))
        }
    }

    fn make_service(values: &[(&str, &str)], secret: &str, issuer_base: &str) -> AuthService {
        AuthService::new(
            Arc::new(MapParameterStore {
                values: values
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }),
            Arc::new(StaticSecretStore {
                value: secret.to_string(),
            }),
            Arc::new(StaticDistributionApi),
            VerifierCache::new(),
        )
        .unwrap()
        .with_issuer_base(issuer_base.to_string())
    }

    fn make_event(uri: &str, querystring: &str, cookie: Option<&str>) -> CloudfrontEvent {
        let mut headers = HashMap::new();
        if let Some(cookie) = cookie {
            headers.insert(
                "cookie".to_string(),
                vec![HeaderEntry::new("Cookie", cookie.to_string())],
            );
        }
        CloudfrontEvent {
            records: vec![CloudfrontRecord {
                cf: CloudfrontRecordData {
                    config: DistributionConfig {
                        distribution_id: DISTRIBUTION_ID.to_string(),
                        distribution_domain_name: "d111111abcdef8.cloudfront.net".to_string(),
                        event_type: "viewer-request".to_string(),
                        request_id: "abc123".to_string(),
                    },
                    request: CloudfrontRequest {
                        client_ip: "203.0.113.50".to_string(),
                        headers,
                        method: "GET".to_string(),
                        querystring: querystring.to_string(),
                        uri: uri.to_string(),
                        other: HashMap::new(),
                    },
                },
            }],
        }
    }

    #[tokio::test]
    async fn test_gate_passes_through_valid_token() {
        let mut server = mockito::Server::new_async().await;
        let _jwks = server
            .mock("GET", format!("/{POOL_ID}/.well-known/jwks.json").as_str())
            .with_status(200)
            .with_body(jwks_body())
            .create_async()
            .await;

        let service = make_service(
            &[
                ("/site.example.com/cognito/user-pool-id", POOL_ID),
                ("/site.example.com/cognito/client-id", TEST_CLIENT_ID),
            ],
            "{}",
            &server.url(),
        );

        let issuer = format!("{}/{POOL_ID}", server.url());
        let token = sign_id_token(&valid_claims(&issuer));
        let event = make_event("/dashboard", "x=1", Some(&format!("idToken={token}")));

        match gate(&service, &event).await {
            CloudfrontResult::Request(request) => {
                assert_eq!(request.uri, "/dashboard");
                assert_eq!(request.querystring, "x=1");
            }
            CloudfrontResult::Response(response) => {
                panic!("expected pass-through, got response {}", response.status)
            }
        }
    }

    #[tokio::test]
    async fn test_gate_redirects_when_cookie_missing() {
        let service = make_service(
            &[(
                "/site.example.com/cognito/login-url",
                "https://auth.example.com/login",
            )],
            "{}",
            "https://unused.example.com",
        );

        let event = make_event("/dashboard", "x=1", None);

        match gate(&service, &event).await {
            CloudfrontResult::Response(response) => {
                assert_eq!(response.status, "302");
                assert_eq!(
                    response.headers["location"][0].value,
                    format!("https://auth.example.com/login?state={STATE_DASHBOARD}")
                );
                assert!(!response.headers.contains_key("set-cookie"));
            }
            CloudfrontResult::Request(_) => panic!("expected a redirect"),
        }
    }

    #[tokio::test]
    async fn test_gate_redirects_on_invalid_token() {
        // A garbage token is rejected before any key material is needed,
        // so no JWKS server is involved.
        let service = make_service(
            &[
                ("/site.example.com/cognito/user-pool-id", POOL_ID),
                ("/site.example.com/cognito/client-id", TEST_CLIENT_ID),
                (
                    "/site.example.com/cognito/login-url",
                    "https://auth.example.com/login",
                ),
            ],
            "{}",
            "https://unused.example.com",
        );

        let event = make_event("/dashboard", "x=1", Some("idToken=not-a-jwt"));

        match gate(&service, &event).await {
            CloudfrontResult::Response(response) => {
                assert_eq!(response.status, "302");
                assert_eq!(
                    response.headers["location"][0].value,
                    format!("https://auth.example.com/login?state={STATE_DASHBOARD}")
                );
            }
            CloudfrontResult::Request(_) => panic!("expected a redirect"),
        }
    }

    #[tokio::test]
    async fn test_gate_returns_503_when_login_url_unavailable() {
        // No login-url parameter configured, so even the redirect fails.
        let service = make_service(&[], "{}", "https://unused.example.com");

        let event = make_event("/dashboard", "", None);

        match gate(&service, &event).await {
            CloudfrontResult::Response(response) => {
                assert_eq!(response.status, "503");
            }
            CloudfrontResult::Request(_) => panic!("expected a response"),
        }
    }

    #[tokio::test]
    async fn test_callback_sets_cookie_and_redirects_to_requested_url() {
        let mut server = mockito::Server::new_async().await;
        let token_endpoint = server
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token":"a","id_token":"XYZ","refresh_token":"r","token_type":"Bearer","expires_in":3600}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let service = make_service(
            &[
                ("/site.example.com/cognito/user-pool/domain", &server.url()),
                (
                    "/site.example.com/cognito/user-pool/client/redirect-uri",
                    "https://site.example.com/callback",
                ),
            ],
            r#"{"clientId":"client-abc","clientSecret":"s3cret"}"#,
            "https://unused.example.com",
        );

        let event = make_event(
            "/callback",
            &format!("code=ABC123&state={STATE_DASHBOARD}"),
            None,
        );

        match complete_callback(&service, &event).await {
            CloudfrontResult::Response(response) => {
                assert_eq!(response.status, "302");
                assert_eq!(response.headers["location"][0].value, "/dashboard?x=1");
                assert_eq!(
                    response.headers["set-cookie"][0].value,
                    "idToken=XYZ; Path=/; Secure; HttpOnly"
                );
            }
            CloudfrontResult::Request(_) => panic!("expected a response"),
        }

        token_endpoint.assert_async().await;
    }

    #[tokio::test]
    async fn test_callback_failure_redirects_without_cookie() {
        let mut server = mockito::Server::new_async().await;
        let _token_endpoint = server
            .mock("POST", "/oauth2/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let service = make_service(
            &[
                ("/site.example.com/cognito/user-pool/domain", &server.url()),
                (
                    "/site.example.com/cognito/user-pool/client/redirect-uri",
                    "https://site.example.com/callback",
                ),
            ],
            r#"{"clientId":"client-abc","clientSecret":"s3cret"}"#,
            "https://unused.example.com",
        );

        let querystring = format!("code=EXPIRED&state={STATE_DASHBOARD}");
        let event = make_event("/callback", &querystring, None);

        match complete_callback(&service, &event).await {
            CloudfrontResult::Response(response) => {
                assert_eq!(response.status, "302");
                assert_eq!(
                    response.headers["location"][0].value,
                    format!("/callback?{querystring}")
                );
                assert!(!response.headers.contains_key("set-cookie"));
            }
            CloudfrontResult::Request(_) => panic!("expected a response"),
        }
    }

    #[tokio::test]
    async fn test_callback_missing_code_redirects_without_exchange() {
        let service = make_service(&[], "{}", "https://unused.example.com");

        let event = make_event("/callback", &format!("state={STATE_DASHBOARD}"), None);

        match complete_callback(&service, &event).await {
            CloudfrontResult::Response(response) => {
                assert_eq!(response.status, "302");
                assert_eq!(
                    response.headers["location"][0].value,
                    format!("/callback?state={STATE_DASHBOARD}")
                );
                assert!(!response.headers.contains_key("set-cookie"));
            }
            CloudfrontResult::Request(_) => panic!("expected a response"),
        }
    }
}
