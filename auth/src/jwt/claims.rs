//! Claims carried by a Cognito-issued identity token.

use serde::{Deserialize, Serialize};

/// Decoded identity-token claims.
///
/// Only the claims the authenticator needs are modeled; Cognito includes
/// more, which serde ignores on decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    pub iss: String,
    /// For identity tokens the audience is the user-pool client id.
    pub aud: String,
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
    /// `"id"` for identity tokens; access tokens carry `"access"`.
    pub token_use: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "cognito:username", default)]
    pub username: Option<String>,
}
