//! Error types for Play client operations

/// Errors from credential resolution, token minting, and request dispatch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Neither credential source is configured, or required fields missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The service-account key file could not be read or parsed.
    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("assertion signing failed: {0}")]
    Signing(String),

    /// The token endpoint rejected or garbled a minting request.
    #[error("token minting failed: {0}")]
    Token(String),

    /// The stored refresh token is revoked or invalid; the operator must
    /// re-run the interactive flow.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The API answered with a non-success status; body text verbatim.
    #[error("{method} {path} returned {status}: {body}")]
    RequestFailed {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    /// Network-level failure, distinct from a server-returned status.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    InvalidResponse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<play_auth::Error> for Error {
    fn from(e: play_auth::Error) -> Self {
        match e {
            play_auth::Error::Http(msg) => Error::Transport(msg),
            play_auth::Error::InvalidCredentials(msg) => Error::InvalidCredentials(msg),
            play_auth::Error::TokenExchange(msg) => Error::Token(msg),
            other => Error::Token(other.to_string()),
        }
    }
}

/// Result alias for Play operations.
pub type Result<T> = std::result::Result<T, Error>;
