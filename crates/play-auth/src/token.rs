//! OAuth token exchange and refresh
//!
//! Handles the two token endpoint interactions:
//! 1. Authorization code exchange (interactive flow completion)
//! 2. Refresh-token grant (access token minting at request time)
//!
//! Both POST to the token endpoint with different grant types. The
//! `*_at` variants take an explicit endpoint for sandbox and test use;
//! production callers use the [`TOKEN_ENDPOINT`] constant.

use serde::{Deserialize, Serialize};

use crate::constants::{REDIRECT_URI, TOKEN_ENDPOINT};
use crate::error::{Error, Result};

/// Response from the token endpoint for both exchange and refresh.
///
/// `refresh_token` is only present on first consent or forced re-consent;
/// the refresh grant omits it. `expires_in` is a delta in seconds from the
/// response time, converted to an absolute timestamp by the caller.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires (delta, not absolute)
    pub expires_in: u64,
}

/// Exchange an authorization code for tokens (interactive flow completion).
///
/// The code comes from the loopback listener; the PKCE verifier proves this
/// process initiated the flow.
pub async fn exchange_code(
    client: &reqwest::Client,
    client_id: &str,
    client_secret: &str,
    code: &str,
    verifier: &str,
) -> Result<TokenResponse> {
    exchange_code_at(TOKEN_ENDPOINT, client, client_id, client_secret, code, verifier).await
}

/// [`exchange_code`] against an explicit token endpoint.
pub async fn exchange_code_at(
    endpoint: &str,
    client: &reqwest::Client,
    client_id: &str,
    client_secret: &str,
    code: &str,
    verifier: &str,
) -> Result<TokenResponse> {
    let response = client
        .post(endpoint)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("code_verifier", verifier),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", REDIRECT_URI),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("token exchange request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::TokenExchange(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid token response: {e}")))
}

/// Mint an access token from a stored refresh token.
///
/// Called by the Play client whenever its cached access token is missing or
/// near expiry. The triple presented here is exactly what the interactive
/// flow persisted.
pub async fn refresh_access_token(
    client: &reqwest::Client,
    client_id: &str,
    client_secret: &str,
    refresh: &str,
) -> Result<TokenResponse> {
    refresh_access_token_at(TOKEN_ENDPOINT, client, client_id, client_secret, refresh).await
}

/// [`refresh_access_token`] against an explicit token endpoint.
pub async fn refresh_access_token_at(
    endpoint: &str,
    client: &reqwest::Client,
    client_id: &str,
    client_secret: &str,
    refresh: &str,
) -> Result<TokenResponse> {
    let response = client
        .post(endpoint)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("token refresh request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));

        // 401/403 means the refresh token is revoked or invalid
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(Error::InvalidCredentials(format!(
                "refresh token rejected ({status}): {body}"
            )));
        }

        return Err(Error::TokenExchange(format!(
            "token refresh returned {status}: {body}"
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid refresh response: {e}")))
}
