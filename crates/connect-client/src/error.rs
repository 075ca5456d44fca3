//! Error types for App Store Connect operations

/// Errors from assertion issuing and request dispatch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configured `.p8` signing key could not be read or parsed.
    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),

    /// Key material was readable but the assertion could not be signed.
    #[error("assertion signing failed: {0}")]
    Signing(String),

    /// The API answered with a non-success status. Carries the response
    /// body verbatim so callers never need to re-fetch diagnostic detail.
    #[error("{method} {path} returned {status}: {body}")]
    RequestFailed {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    /// Network-level failure (DNS, connect, timeout), as opposed to a
    /// server-returned error status.
    #[error("transport error: {0}")]
    Transport(String),

    /// A success response whose body was not the JSON we expected.
    #[error("invalid response body: {0}")]
    InvalidResponse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Result alias for Connect operations.
pub type Result<T> = std::result::Result<T, Error>;
