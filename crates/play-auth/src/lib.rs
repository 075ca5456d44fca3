//! Google Play OAuth authorization library
//!
//! Provides the one-time interactive authorization flow that turns user
//! consent into a durable renewable credential, plus the token exchange and
//! credential file storage the Play client builds on. Standalone library
//! with no dependency on the CLI binary.
//!
//! Credential flow:
//! 1. `flow::authorize()` builds a PKCE authorization URL and binds the
//!    loopback listener before opening the browser
//! 2. The listener captures the single-use authorization code (or an error,
//!    or times out) and tears down
//! 3. `token::exchange_code()` trades the code for tokens; a missing refresh
//!    token fails the flow with remediation guidance
//! 4. The `{clientId, clientSecret, refreshToken, savedAt}` record is saved
//!    via `credentials::CredentialStore::save()`
//! 5. The Play client later loads the record and calls
//!    `token::refresh_access_token()` on demand

pub mod constants;
pub mod credentials;
pub mod error;
pub mod flow;
pub mod pkce;
pub mod token;

pub use constants::*;
pub use credentials::{Credential, CredentialStore};
pub use error::{Error, Result};
pub use flow::authorize;
pub use token::{TokenResponse, exchange_code, refresh_access_token};
