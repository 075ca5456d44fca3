//! Error types for the interactive authorization flow

/// Errors from the authorization flow and its supporting operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The user declined consent, or the platform redirected with an error.
    #[error("authorization denied: {0}")]
    Denied(String),

    /// No redirect arrived before the deadline.
    #[error("authorization timed out waiting for the browser redirect")]
    Timeout,

    /// The exchange succeeded but issued no refresh token. The platform only
    /// does that on first consent or forced re-consent.
    #[error(
        "no refresh token in the token response; revoke the application's access \
         at https://myaccount.google.com/permissions and run the flow again"
    )]
    NoRefreshToken,

    /// The loopback port is already bound, i.e. another session is in flight.
    #[error("another authorization session is already listening on the loopback port")]
    SessionActive,

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("credential parse error: {0}")]
    CredentialParse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Result alias for authorization operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_refresh_token_includes_remediation() {
        let msg = Error::NoRefreshToken.to_string();
        assert!(
            msg.contains("myaccount.google.com/permissions"),
            "operator needs the revoke URL, got: {msg}"
        );
    }

    #[test]
    fn denied_carries_platform_error_text() {
        let err = Error::Denied("access_denied".into());
        assert_eq!(err.to_string(), "authorization denied: access_denied");
    }

    #[test]
    fn error_debug_includes_variant_name() {
        let debug = format!("{:?}", Error::Timeout);
        assert!(debug.contains("Timeout"), "got: {debug}");
    }
}
