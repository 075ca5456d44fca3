//! Shared error types

use thiserror::Error;

/// Errors shared across the workspace: configuration resolution and
/// filesystem access. Platform-specific failures live in each client crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;
