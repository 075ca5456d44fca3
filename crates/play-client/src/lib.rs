//! Google Play publishing API client
//!
//! Dispatches authenticated requests against the Play publishing REST
//! surface. Exactly one credential source backs a client: a long-lived
//! service-account key file, or the renewable OAuth triple captured by the
//! interactive flow in `play-auth`. Either way the source is exchanged for
//! short-lived access tokens that are cached in memory until shortly before
//! expiry.
//!
//! The per-endpoint operation catalog (edits, listings, tracks, reviews)
//! lives outside this crate and composes multi-step operations by sequencing
//! `PlayClient::send` and `PlayClient::upload`.

pub mod auth;
pub mod client;
pub mod error;

pub use auth::{AuthSource, TokenSource};
pub use client::{PlayClient, BASE_URL};
pub use error::{Error, Result};
