mod common;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
};

use axum::{
    Form, Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
    routing::post,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::json;
use sporldl::{
    Error, server,
    management::TokenExchange,
    spotify::{SpotifyTokenEndpoint, auth::authorize_url},
    types::PendingSignIn,
};
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<StdMutex<Vec<(Option<String>, HashMap<String, String>)>>>,
}

async fn token_endpoint(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    recorded
        .requests
        .lock()
        .unwrap()
        .push((authorization, form.clone()));

    let revoked = form.get("refresh_token").map(String::as_str) == Some("revoked");
    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") => Json(json!({
            "access_token": "from-code",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-from-code",
            "scope": "playlist-read-private"
        }))
        .into_response(),
        Some("refresh_token") if revoked => {
            (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_grant"}))).into_response()
        }
        Some("refresh_token") => Json(json!({
            "access_token": "from-refresh",
            "token_type": "Bearer",
            "expires_in": 1800
        }))
        .into_response(),
        _ => (StatusCode::BAD_REQUEST, "unsupported grant").into_response(),
    }
}

async fn token_server() -> (String, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/api/token", post(token_endpoint))
        .with_state(recorded.clone());
    let base = common::serve(app).await;
    (format!("{}/api/token", base), recorded)
}

fn endpoint(token_url: String) -> SpotifyTokenEndpoint {
    SpotifyTokenEndpoint::new(
        token_url,
        "client-id".to_string(),
        "client-secret".to_string(),
    )
}

#[tokio::test]
async fn test_refresh_uses_basic_client_credentials() {
    let (token_url, recorded) = token_server().await;

    let response = endpoint(token_url).refresh("refresh-0").await.unwrap();

    assert_eq!(response.access_token, "from-refresh");
    assert_eq!(response.expires_in, 1800);
    assert_eq!(response.refresh_token, None);

    let requests = recorded.requests.lock().unwrap();
    let (authorization, form) = &requests[0];
    let expected = format!("Basic {}", STANDARD.encode("client-id:client-secret"));
    assert_eq!(authorization.as_deref(), Some(expected.as_str()));
    assert_eq!(form.get("grant_type").map(String::as_str), Some("refresh_token"));
    assert_eq!(form.get("refresh_token").map(String::as_str), Some("refresh-0"));
}

#[tokio::test]
async fn test_refresh_rejected_by_provider() {
    let (token_url, _) = token_server().await;

    let err = endpoint(token_url).refresh("revoked").await.unwrap_err();

    assert!(matches!(err, Error::Http { status: 400, .. }));
}

#[tokio::test]
async fn test_refresh_with_malformed_body() {
    let app = Router::new().route("/api/token", post(|| async { "not json" }));
    let base = common::serve(app).await;

    let err = endpoint(format!("{}/api/token", base))
        .refresh("refresh-0")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MalformedResponse(_)));
}

#[tokio::test]
async fn test_exchange_code_sends_verifier_and_redirect() {
    let (token_url, recorded) = token_server().await;

    let token = endpoint(token_url)
        .exchange_code("the-code", "the-verifier", "http://127.0.0.1:8888/callback")
        .await
        .unwrap();

    assert_eq!(token.access_token, "from-code");
    assert_eq!(token.refresh_token, "refresh-from-code");
    assert_eq!(token.last_error, None);

    let requests = recorded.requests.lock().unwrap();
    let (_, form) = &requests[0];
    assert_eq!(form.get("grant_type").map(String::as_str), Some("authorization_code"));
    assert_eq!(form.get("code").map(String::as_str), Some("the-code"));
    assert_eq!(form.get("code_verifier").map(String::as_str), Some("the-verifier"));
    assert_eq!(
        form.get("redirect_uri").map(String::as_str),
        Some("http://127.0.0.1:8888/callback")
    );
}

#[test]
fn test_authorize_url() {
    let url = authorize_url(
        "https://accounts.spotify.com/authorize",
        "client-id",
        "http://127.0.0.1:8888/callback",
        "challenge",
        "csrf",
        "playlist-read-private playlist-read-collaborative",
    )
    .unwrap();

    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
    assert_eq!(url.host_str(), Some("accounts.spotify.com"));
    assert_eq!(params["client_id"], "client-id");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["redirect_uri"], "http://127.0.0.1:8888/callback");
    assert_eq!(params["code_challenge_method"], "S256");
    assert_eq!(params["code_challenge"], "challenge");
    assert_eq!(params["state"], "csrf");
    assert_eq!(
        params["scope"],
        "playlist-read-private playlist-read-collaborative"
    );
}

#[test]
fn test_authorize_url_rejects_invalid_base() {
    let err = authorize_url("not a url", "id", "uri", "c", "s", "scope").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

fn pending(csrf_state: &str) -> Arc<Mutex<Option<PendingSignIn>>> {
    Arc::new(Mutex::new(Some(PendingSignIn {
        code_verifier: "verifier".to_string(),
        csrf_state: csrf_state.to_string(),
        code: None,
        error: None,
    })))
}

#[tokio::test]
async fn test_callback_records_code() {
    let state = pending("csrf-1");
    let base = common::serve(server::router(Arc::clone(&state))).await;

    let response = reqwest::get(format!("{}/callback?state=csrf-1&code=abc", base))
        .await
        .unwrap();
    assert!(response.status().is_success());

    let lock = state.lock().await;
    let pending = lock.as_ref().unwrap();
    assert_eq!(pending.code.as_deref(), Some("abc"));
    assert_eq!(pending.error, None);
}

#[tokio::test]
async fn test_callback_ignores_unexpected_state() {
    let state = pending("csrf-1");
    let base = common::serve(server::router(Arc::clone(&state))).await;

    reqwest::get(format!("{}/callback?state=forged&code=abc", base))
        .await
        .unwrap();
    reqwest::get(format!("{}/callback?code=abc", base))
        .await
        .unwrap();

    let lock = state.lock().await;
    let pending = lock.as_ref().unwrap();
    assert_eq!(pending.code, None);
    assert_eq!(pending.error, None);
}

#[tokio::test]
async fn test_callback_records_provider_error() {
    let state = pending("csrf-1");
    let base = common::serve(server::router(Arc::clone(&state))).await;

    reqwest::get(format!("{}/callback?state=csrf-1&error=access_denied", base))
        .await
        .unwrap();

    let lock = state.lock().await;
    let pending = lock.as_ref().unwrap();
    assert_eq!(pending.error.as_deref(), Some("access_denied"));
    assert_eq!(pending.code, None);
}

#[tokio::test]
async fn test_callback_without_pending_sign_in() {
    let state: Arc<Mutex<Option<PendingSignIn>>> = Arc::new(Mutex::new(None));
    let base = common::serve(server::router(Arc::clone(&state))).await;

    let response = reqwest::get(format!("{}/callback?state=x&code=abc", base))
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert!(state.lock().await.is_none());
}

#[tokio::test]
async fn test_health() {
    let base = common::serve(server::router(Arc::new(Mutex::new(None)))).await;

    let body: serde_json::Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
