//! App Store Connect API client
//!
//! Authenticates with short-lived self-signed ES256 assertions and exposes a
//! generic request dispatcher for the Connect REST surface. The per-endpoint
//! operation catalog lives outside this crate and consumes exactly two entry
//! points: `ConnectClient::send` and `ConnectClient::upload`.
//!
//! Credential flow:
//! 1. `AssertionIssuer::bearer()` returns a cached assertion, regenerating
//!    from the `.p8` key file only when the cached one is within 60 s of
//!    expiry
//! 2. `ConnectClient::send()` attaches the assertion as a Bearer token and
//!    normalizes transport and status failures
//! 3. Binary payloads go through `ConnectClient::upload()` against the
//!    reservation URLs returned by prior `send` calls

pub mod assertion;
pub mod client;
pub mod error;

pub use assertion::AssertionIssuer;
pub use client::{ConnectClient, ConnectConfig, BASE_URL};
pub use error::{Error, Result};
