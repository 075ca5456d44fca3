//! Authenticated request dispatch for the Connect API
//!
//! The dispatcher is stateless between calls: multi-step operations (reserve
//! an upload slot, PUT the binary to the returned URLs, commit) are composed
//! by callers purely by sequencing `send`/`upload`. Paths that are already
//! absolute pass through unchanged so reservation URLs returned by the API
//! can be used verbatim.

use std::path::Path;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::assertion::AssertionIssuer;
use crate::error::{Error, Result};

/// Production base URL, version prefix included.
pub const BASE_URL: &str = "https://api.appstoreconnect.apple.com/v1";

/// Connect identity configuration, resolved by the caller (env, flags).
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Key ID of the `.p8` key, embedded in the assertion header
    pub key_id: String,
    /// Issuer ID of the team
    pub issuer_id: String,
    /// Path to the `.p8` private key file
    pub key_path: std::path::PathBuf,
    /// Optional vendor number for finance/sales endpoints
    pub vendor_number: Option<String>,
}

/// App Store Connect API client.
pub struct ConnectClient {
    issuer: AssertionIssuer,
    http: reqwest::Client,
    base_url: String,
    vendor_number: Option<String>,
}

impl ConnectClient {
    pub fn new(config: ConnectConfig) -> Self {
        Self {
            issuer: AssertionIssuer::new(config.key_id, config.issuer_id, config.key_path),
            http: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
            vendor_number: config.vendor_number,
        }
    }

    /// Override the base URL (sandbox environments, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Vendor number for endpoints that require one, if configured.
    pub fn vendor_number(&self) -> Option<&str> {
        self.vendor_number.as_deref()
    }

    /// Perform an authenticated JSON request.
    ///
    /// `path` is joined onto the base URL unless it is already absolute.
    /// Returns the parsed JSON body, or `{}` for a 204. Non-success statuses
    /// become [`Error::RequestFailed`] carrying the body text verbatim.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: Option<&[(&str, &str)]>,
    ) -> Result<Value> {
        let token = self.issuer.bearer().await?;
        let url = if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        };

        let mut request = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(&token)
            .header(CONTENT_TYPE, "application/json");
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, path, "dispatching request");
        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{method} {path}: {e}")))?;

        read_json_response(&method, path, response).await
    }

    /// Upload a local file as raw bytes with the given content type.
    ///
    /// The whole file is read into memory and PUT without JSON encoding;
    /// `url` comes verbatim from a prior reservation response.
    pub async fn upload(&self, url: &str, local_path: &Path, content_type: &str) -> Result<Value> {
        let data = tokio::fs::read(local_path)
            .await
            .map_err(|e| Error::Io(format!("reading {}: {e}", local_path.display())))?;
        let token = self.issuer.bearer().await?;

        debug!(url, bytes = data.len(), content_type, "uploading binary payload");
        let response = self
            .http
            .put(url)
            .bearer_auth(&token)
            .header(CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("PUT {url}: {e}")))?;

        read_json_response(&Method::PUT, url, response).await
    }
}

/// Shared status handling: non-success carries the literal body text, 204
/// short-circuits to `{}` without attempting to parse an empty body.
async fn read_json_response(method: &Method, path: &str, response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::RequestFailed {
            method: method.to_string(),
            path: path.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| Error::InvalidResponse(format!("{method} {path}: {e}")))
}
