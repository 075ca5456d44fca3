//! Interactive authorization CLI
//!
//! One-shot tool the operator runs out-of-band to populate the credential
//! store for the renewable-credential platform:
//!
//! ```text
//! app-publish-auth google --client-id=ID --client-secret=SECRET
//! ```
//!
//! Flags fall back to `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET`. The
//! publishing process itself never runs this flow; it only reads the store
//! this tool writes.

use anyhow::{Context, Result, bail};
use common::Secret;
use play_auth::credentials::CredentialStore;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "Usage: app-publish-auth google [--client-id=ID --client-secret=SECRET]

Flags fall back to the GOOGLE_CLIENT_ID / GOOGLE_CLIENT_SECRET environment
variables. Create an OAuth client of type \"Desktop app\" in the Cloud
console (APIs & Services -> Credentials) to obtain them.";

#[tokio::main]
async fn main() -> Result<()> {
    // Human-facing tool: plain formatted output, LOG_LEVEL / RUST_LOG override
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("google") => auth_google(&args[2..]).await,
        Some(other) => bail!("unknown authorization target: {other}\n\n{USAGE}"),
        None => bail!("{USAGE}"),
    }
}

async fn auth_google(args: &[String]) -> Result<()> {
    let client_id = flag_or_env(args, "client-id", "GOOGLE_CLIENT_ID").ok_or_else(|| {
        common::Error::Config(format!("OAuth client id required\n\n{USAGE}"))
    })?;
    let client_secret: Secret<String> = flag_or_env(args, "client-secret", "GOOGLE_CLIENT_SECRET")
        .ok_or_else(|| {
            common::Error::Config(format!("OAuth client secret required\n\n{USAGE}"))
        })?
        .into();

    let store = CredentialStore::default_location()
        .context("resolving the credential store location")?;
    let http = reqwest::Client::new();

    play_auth::authorize(&http, &store, &client_id, &client_secret)
        .await
        .context("interactive authorization failed")?;

    info!(
        path = %store.path().display(),
        "Google credentials saved; publishing tools will load them automatically"
    );
    Ok(())
}

/// `--<flag>=value` from the argument list, else the environment variable.
fn flag_or_env(args: &[String], flag: &str, env: &str) -> Option<String> {
    let prefix = format!("--{flag}=");
    args.iter()
        .find_map(|a| a.strip_prefix(&prefix).map(str::to_string))
        .or_else(|| std::env::var(env).ok().filter(|v| !v.is_empty()))
}
