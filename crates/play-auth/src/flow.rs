//! Interactive loopback authorization flow
//!
//! Turns a one-time browser consent into the durable renewable credential.
//! The listener is bound before the browser opens so the redirect cannot
//! race it, and the whole session is a single logical wait: the first
//! terminal event (authorization code, platform error, or the deadline)
//! wins, and the loser is a no-op. The port is released on every exit path.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use chrono::Utc;
use common::Secret;
use tokio::net::TcpListener;
use tokio::sync::{Notify, mpsc};
use tracing::{info, warn};

use crate::constants::{AUTH_TIMEOUT_SECS, CALLBACK_PATH, REDIRECT_PORT};
use crate::credentials::{Credential, CredentialStore};
use crate::error::{Error, Result};
use crate::pkce;
use crate::token;

/// How long to let the final browser response flush before hard-aborting
/// the listener task.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

const SUCCESS_PAGE: &str = r#"<html><body style="font-family:system-ui;display:flex;justify-content:center;align-items:center;height:100vh;margin:0;background:#0a0a0a;color:#fff">
  <div style="text-align:center">
    <h1 style="font-size:48px;margin-bottom:8px">&#10003;</h1>
    <h2>Authentication successful</h2>
    <p style="color:#888">You can close this tab.</p>
  </div>
</body></html>"#;

fn failure_page(error: &str) -> String {
    format!("<h1>Authentication failed</h1><p>{error}</p><p>You can close this tab.</p>")
}

/// Run the interactive flow: consent in the browser, code captured on the
/// loopback listener, exchanged for tokens, persisted to `store`.
///
/// Fails without persisting anything if consent is denied, the deadline
/// elapses, or the exchange yields no refresh token.
pub async fn authorize(
    http: &reqwest::Client,
    store: &CredentialStore,
    client_id: &str,
    client_secret: &Secret<String>,
) -> Result<()> {
    let verifier = pkce::generate_verifier();
    let challenge = pkce::compute_challenge(&verifier);
    let state = pkce::generate_state();
    let auth_url = pkce::build_authorization_url(client_id, &state, &challenge);

    // Bind before opening the browser so the redirect cannot outrun us.
    let listener = bind_loopback().await?;

    info!(url = %auth_url, "open this URL in your browser if it does not open automatically");
    launch_browser(&auth_url);

    let code = capture_code(listener, state, Duration::from_secs(AUTH_TIMEOUT_SECS)).await?;

    let tokens =
        token::exchange_code(http, client_id, client_secret.expose(), &code, &verifier).await?;
    persist_tokens(store, client_id, client_secret, tokens).await?;

    info!(path = %store.path().display(), "authorization complete");
    Ok(())
}

/// Persist the exchanged tokens, or fail with [`Error::NoRefreshToken`]
/// before touching the store when the platform issued none.
async fn persist_tokens(
    store: &CredentialStore,
    client_id: &str,
    client_secret: &Secret<String>,
    tokens: token::TokenResponse,
) -> Result<()> {
    let refresh_token = tokens.refresh_token.ok_or(Error::NoRefreshToken)?;
    store
        .save(&Credential {
            client_id: client_id.to_string(),
            client_secret: client_secret.expose().clone(),
            refresh_token,
            saved_at: Utc::now(),
        })
        .await
}

/// Bind the fixed loopback port, distinguishing "someone else is mid-flow"
/// from other bind failures.
async fn bind_loopback() -> Result<TcpListener> {
    let addr = SocketAddr::from(([127, 0, 0, 1], REDIRECT_PORT));
    TcpListener::bind(addr).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            Error::SessionActive
        } else {
            Error::Io(format!("binding loopback listener: {e}"))
        }
    })
}

/// Launch the platform's default URL opener, best-effort.
///
/// Headless operators rely on the logged URL instead, so a launch failure
/// is never fatal.
fn launch_browser(url: &str) {
    let spawned = if cfg!(target_os = "macos") {
        std::process::Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        std::process::Command::new("cmd").args(["/C", "start", "", url]).spawn()
    } else {
        std::process::Command::new("xdg-open").arg(url).spawn()
    };
    if let Err(e) = spawned {
        warn!(error = %e, "could not launch a browser, use the logged URL");
    }
}

/// Terminal outcome delivered by the callback handler.
enum CallbackOutcome {
    Code(String),
    Denied(String),
}

#[derive(Clone)]
struct CallbackState {
    tx: mpsc::Sender<CallbackOutcome>,
    expected_state: String,
}

/// Serve the one-shot listener until the first terminal outcome or the
/// deadline, whichever fires first, then tear the listener down.
///
/// Teardown runs on every branch: graceful shutdown first so the response
/// to the browser finishes flushing, hard abort if connections linger past
/// [`SHUTDOWN_GRACE`]. After return the port is immediately rebindable.
async fn capture_code(
    listener: TcpListener,
    expected_state: String,
    deadline: Duration,
) -> Result<String> {
    let (tx, mut rx) = mpsc::channel(1);
    let shutdown = Arc::new(Notify::new());

    let app = Router::new()
        .route(CALLBACK_PATH, get(callback))
        .fallback(|| async { StatusCode::NOT_FOUND })
        .with_state(CallbackState { tx, expected_state });

    let notify = shutdown.clone();
    let mut server = tokio::spawn(async move {
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move { notify.notified().await })
            .await;
        if let Err(e) = served {
            warn!(error = %e, "callback listener exited with error");
        }
    });

    let outcome = tokio::time::timeout(deadline, rx.recv()).await;

    shutdown.notify_one();
    if tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await.is_err() {
        server.abort();
    }

    match outcome {
        Err(_elapsed) => Err(Error::Timeout),
        Ok(None) => Err(Error::Io("callback listener closed unexpectedly".into())),
        Ok(Some(CallbackOutcome::Denied(error))) => Err(Error::Denied(error)),
        Ok(Some(CallbackOutcome::Code(code))) => Ok(code),
    }
}

/// The only accepted path. An `error` parameter or a well-formed code is
/// terminal; anything else gets a client error and leaves the session open.
async fn callback(
    State(state): State<CallbackState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(error) = params.get("error") {
        // try_send: if the session already resolved, this is a no-op
        let _ = state.tx.try_send(CallbackOutcome::Denied(error.clone()));
        return Html(failure_page(error)).into_response();
    }

    match (params.get("code"), params.get("state")) {
        (Some(code), Some(returned)) if *returned == state.expected_state => {
            let _ = state.tx.try_send(CallbackOutcome::Code(code.clone()));
            Html(SUCCESS_PAGE).into_response()
        }
        _ => (StatusCode::BAD_REQUEST, "Missing code").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ephemeral_listener() -> (TcpListener, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, addr)
    }

    #[tokio::test]
    async fn well_formed_code_resolves_session() {
        let (listener, addr) = ephemeral_listener().await;
        let capture = tokio::spawn(capture_code(
            listener,
            "state-1".into(),
            Duration::from_secs(5),
        ));

        let body = reqwest::get(format!("http://{addr}/callback?code=auth-1&state=state-1"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("Authentication successful"), "got: {body}");

        assert_eq!(capture.await.unwrap().unwrap(), "auth-1");
    }

    #[tokio::test]
    async fn error_parameter_fails_session_as_denied() {
        let (listener, addr) = ephemeral_listener().await;
        let capture = tokio::spawn(capture_code(
            listener,
            "state-1".into(),
            Duration::from_secs(5),
        ));

        let response = reqwest::get(format!("http://{addr}/callback?error=access_denied"))
            .await
            .unwrap();
        assert!(response.text().await.unwrap().contains("Authentication failed"));

        let err = capture.await.unwrap().unwrap_err();
        match err {
            Error::Denied(reason) => assert_eq!(reason, "access_denied"),
            other => panic!("expected Denied, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_code_keeps_session_open() {
        let (listener, addr) = ephemeral_listener().await;
        let capture = tokio::spawn(capture_code(
            listener,
            "state-1".into(),
            Duration::from_secs(5),
        ));

        let response = reqwest::get(format!("http://{addr}/callback")).await.unwrap();
        assert_eq!(response.status().as_u16(), 400);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!capture.is_finished(), "malformed request must not end the session");

        // A later well-formed redirect still succeeds
        reqwest::get(format!("http://{addr}/callback?code=late&state=state-1"))
            .await
            .unwrap();
        assert_eq!(capture.await.unwrap().unwrap(), "late");
    }

    #[tokio::test]
    async fn state_mismatch_keeps_session_open() {
        let (listener, addr) = ephemeral_listener().await;
        let capture = tokio::spawn(capture_code(
            listener,
            "state-1".into(),
            Duration::from_secs(5),
        ));

        let response = reqwest::get(format!("http://{addr}/callback?code=forged&state=wrong"))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!capture.is_finished());

        reqwest::get(format!("http://{addr}/callback?code=genuine&state=state-1"))
            .await
            .unwrap();
        assert_eq!(capture.await.unwrap().unwrap(), "genuine");
    }

    #[tokio::test]
    async fn other_paths_get_not_found_without_ending_session() {
        let (listener, addr) = ephemeral_listener().await;
        let capture = tokio::spawn(capture_code(
            listener,
            "state-1".into(),
            Duration::from_secs(5),
        ));

        let response = reqwest::get(format!("http://{addr}/favicon.ico")).await.unwrap();
        assert_eq!(response.status().as_u16(), 404);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!capture.is_finished());

        reqwest::get(format!("http://{addr}/callback?code=ok&state=state-1"))
            .await
            .unwrap();
        assert_eq!(capture.await.unwrap().unwrap(), "ok");
    }

    #[tokio::test]
    async fn deadline_fails_with_timeout_and_releases_port() {
        let (listener, addr) = ephemeral_listener().await;
        let err = capture_code(listener, "state-1".into(), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout), "got: {err:?}");

        // The port must be immediately rebindable by a fresh session
        TcpListener::bind(addr)
            .await
            .expect("port must be released after timeout");
    }

    #[tokio::test]
    async fn first_code_wins() {
        let (listener, addr) = ephemeral_listener().await;
        let capture = tokio::spawn(capture_code(
            listener,
            "state-1".into(),
            Duration::from_secs(5),
        ));

        let a = reqwest::get(format!("http://{addr}/callback?code=code-a&state=state-1"));
        let b = reqwest::get(format!("http://{addr}/callback?code=code-b&state=state-1"));
        // Both requests may be answered; exactly one code resolves the session.
        let _ = tokio::join!(a, b);

        let code = capture.await.unwrap().unwrap();
        assert!(
            code == "code-a" || code == "code-b",
            "resolved with unexpected code: {code}"
        );
    }

    #[tokio::test]
    async fn port_released_after_successful_session() {
        let (listener, addr) = ephemeral_listener().await;
        let capture = tokio::spawn(capture_code(
            listener,
            "state-1".into(),
            Duration::from_secs(5),
        ));

        reqwest::get(format!("http://{addr}/callback?code=done&state=state-1"))
            .await
            .unwrap();
        capture.await.unwrap().unwrap();

        TcpListener::bind(addr)
            .await
            .expect("port must be released after success");
    }

    #[tokio::test]
    async fn exchange_without_refresh_token_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("google.json"));

        // Credential from an earlier successful run
        let prior = Credential {
            client_id: "cid".into(),
            client_secret: "cs".into(),
            refresh_token: "1//rt_prior".into(),
            saved_at: Utc::now(),
        };
        store.save(&prior).await.unwrap();

        // Repeat consent: the platform returns only an access token
        let tokens = token::TokenResponse {
            access_token: "ya29.only".into(),
            refresh_token: None,
            expires_in: 3599,
        };
        let err = persist_tokens(&store, "cid", &"cs".into(), tokens)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoRefreshToken), "got: {err:?}");

        // Pre-existing store content is untouched
        assert_eq!(store.load().await.unwrap(), prior);
    }

    #[tokio::test]
    async fn fresh_refresh_token_replaces_prior_credential() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("google.json"));

        let tokens = token::TokenResponse {
            access_token: "ya29.new".into(),
            refresh_token: Some("1//rt_new".into()),
            expires_in: 3599,
        };
        persist_tokens(&store, "cid", &"cs".into(), tokens)
            .await
            .unwrap();

        let saved = store.load().await.unwrap();
        assert_eq!(saved.client_id, "cid");
        assert_eq!(saved.client_secret, "cs");
        assert_eq!(saved.refresh_token, "1//rt_new");
    }

    /// End-to-end over the fixed port: a denied consent fails the flow, a
    /// concurrent second session cannot bind, nothing is persisted, and the
    /// port is released afterwards. One test owns the fixed port to avoid
    /// cross-test collisions.
    #[tokio::test]
    async fn authorize_on_fixed_port_denied_consent() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CredentialStore::new(dir.path().join("google.json")));
        let http = reqwest::Client::new();

        let store_for_flow = store.clone();
        let flow = tokio::spawn(async move {
            authorize(
                &reqwest::Client::new(),
                &store_for_flow,
                "cid.apps.example",
                &"GOCSPX-secret".into(),
            )
            .await
        });

        // Wait until the listener is up (any other path answers 404)
        let probe = format!("http://127.0.0.1:{REDIRECT_PORT}/probe");
        let mut listening = false;
        for _ in 0..50 {
            if let Ok(resp) = http.get(&probe).send().await {
                assert_eq!(resp.status().as_u16(), 404);
                listening = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(listening, "listener never came up on the fixed port");

        // While the session is in flight, a second one cannot bind
        let second = bind_loopback().await;
        assert!(
            matches!(second, Err(Error::SessionActive)),
            "got: {second:?}"
        );

        // Deny consent
        http.get(format!(
            "http://127.0.0.1:{REDIRECT_PORT}/callback?error=access_denied"
        ))
        .send()
        .await
        .unwrap();

        let err = flow.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Denied(_)), "got: {err:?}");
        assert!(store.load().await.is_none(), "denied flow must not persist");

        // Port is released once the session ends
        let mut rebindable = false;
        for _ in 0..50 {
            if bind_loopback().await.is_ok() {
                rebindable = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(rebindable, "fixed port must be released after the session");
    }
}
