//! Google Play OAuth constants
//!
//! Endpoint and redirect configuration for the loopback authorization-code
//! grant. The client id/secret are per-operator values (a "Desktop app"
//! OAuth client) and are supplied by the caller, never embedded here.

/// Authorization endpoint presented to the user's browser
pub const AUTHORIZE_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Token endpoint for code exchange and refresh-token grants
pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Scope covering the Play publishing API surface
pub const PUBLISHER_SCOPE: &str = "https://www.googleapis.com/auth/androidpublisher";

/// Loopback port the one-shot listener binds. Fixed because the redirect
/// URI is registered with the platform; a second concurrent session fails
/// the bind rather than racing for the redirect.
pub const REDIRECT_PORT: u16 = 19847;

/// Redirect URI embedded in the authorization URL
pub const REDIRECT_URI: &str = "http://localhost:19847/callback";

/// The only path the listener accepts
pub const CALLBACK_PATH: &str = "/callback";

/// How long the operator has to complete consent in the browser
pub const AUTH_TIMEOUT_SECS: u64 = 120;
