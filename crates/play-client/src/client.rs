//! Authenticated request dispatch for the Play publishing API
//!
//! Stateless between calls. The edit lifecycle (insert an edit, stage
//! changes, commit) is a caller concern composed from `send`; binary
//! artifacts go through `upload` against the upload URLs the API hands back.

use std::path::Path;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::debug;

use play_auth::credentials::CredentialStore;

use crate::auth::{AuthSource, TokenSource};
use crate::error::{Error, Result};

/// Production base URL, version prefix included.
pub const BASE_URL: &str = "https://androidpublisher.googleapis.com/androidpublisher/v3";

/// Google Play publishing API client.
pub struct PlayClient {
    tokens: TokenSource,
    http: reqwest::Client,
    base_url: String,
}

impl PlayClient {
    /// Build a client over an already-resolved credential source.
    pub fn new(source: AuthSource) -> Self {
        let http = reqwest::Client::new();
        Self {
            tokens: TokenSource::new(source, http.clone()),
            http,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Build a client from process configuration: an explicit
    /// service-account key wins, else the stored renewable credential.
    /// Neither configured is a [`Error::Configuration`].
    pub async fn from_store(
        store: &CredentialStore,
        service_account_key: Option<std::path::PathBuf>,
    ) -> Result<Self> {
        let source = AuthSource::resolve(service_account_key, store).await?;
        Ok(Self::new(source))
    }

    /// Override the base URL (tests, alternate API roots).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Perform an authenticated JSON request against the publishing API.
    ///
    /// Same contract as the Connect dispatcher: absolute paths pass through,
    /// 204 reads as `{}`, non-success statuses carry the body verbatim.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: Option<&[(&str, &str)]>,
    ) -> Result<Value> {
        let token = self.tokens.bearer().await?;
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
    pub async fn upload(&self, url: &str, local_path: &Path, content_type: &str) -> Result<Value> {
        let data = tokio::fs::read(local_path)
            .await
            .map_err(|e| Error::Io(format!("reading {}: {e}", local_path.display())))?;
        let token = self.tokens.bearer().await?;

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
