//! Integration tests for the HTTP auth client against a mock backend.

use axum::{
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use dashkit_session::{AuthApi, AuthStore, Config, HttpAuthClient, SessionError};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

const SESSION: &str = "session=valid";

async fn me(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    let cookie = headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if cookie.contains(SESSION) {
        Ok(Json(json!({
            "id": "u1",
            "email": "alice@example.com",
            "name": "Alice",
            "credits": 12,
            "monthlyCredits": 100,
            "avatar": "https://example.com/a.png",
            "role": "admin"
        })))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

/// Start the mock backend on an ephemeral port and return its base URL.
async fn spawn_backend(logout_status: StatusCode, logouts: Arc<AtomicUsize>) -> String {
    let app = Router::new().route("/api/auth/me", get(me)).route(
        "/api/auth/logout",
        post(move || {
            let logouts = logouts.clone();
            async move {
                logouts.fetch_add(1, Ordering::SeqCst);
                logout_status
            }
        }),
    );

    serve(app).await
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn config(api_url: &str, cookie: Option<&str>) -> Config {
    let api_url = api_url.to_string();
    let cookie = cookie.map(str::to_string);
    Config::from_lookup(move |key| match key {
        "DASHKIT_API_URL" => Some(api_url.clone()),
        "DASHKIT_SESSION_COOKIE" => cookie.clone(),
        "DASHKIT_HTTP_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap()
}

#[tokio::test]
async fn fetches_user_with_session_cookie() {
    let base = spawn_backend(StatusCode::NO_CONTENT, Arc::default()).await;
    let client = HttpAuthClient::new(&config(&base, Some(SESSION))).unwrap();

    let user = client.current_user().await.unwrap();
    assert_eq!(user.name, "Alice");
    assert_eq!(user.monthly_credits, 100);
    assert_eq!(user.avatar.as_deref(), Some("https://example.com/a.png"));
    assert_eq!(user.extra.get("role"), Some(&json!("admin")));
}

#[tokio::test]
async fn base_path_prefix_is_kept() {
    let app = Router::new().nest("/backend", Router::new().route("/api/auth/me", get(me)));
    let base = format!("{}/backend", serve(app).await);
    let client = HttpAuthClient::new(&config(&base, Some(SESSION))).unwrap();

    let user = client.current_user().await.unwrap();
    assert_eq!(user.id, "u1");
}

#[tokio::test]
async fn unauthorized_is_a_status_error() {
    let base = spawn_backend(StatusCode::NO_CONTENT, Arc::default()).await;
    let client = HttpAuthClient::new(&config(&base, None)).unwrap();

    let err = client.current_user().await.unwrap_err();
    assert!(matches!(err, SessionError::Status { status: 401, .. }));
}

#[tokio::test]
async fn store_transitions() {
    let logouts = Arc::new(AtomicUsize::new(0));
    let base = spawn_backend(StatusCode::NO_CONTENT, logouts.clone()).await;
    let mut auth = AuthStore::new(HttpAuthClient::new(&config(&base, Some(SESSION))).unwrap());

    auth.fetch_current_user().await;
    assert_eq!(auth.user().map(|u| u.id.as_str()), Some("u1"));
    assert_eq!(auth.state().error, None);

    auth.logout().await;
    assert_eq!(logouts.load(Ordering::SeqCst), 1);
    assert_eq!(auth.user(), None);
    assert_eq!(auth.state().error, None);
}

#[tokio::test]
async fn failed_calls_set_error() {
    let base = spawn_backend(StatusCode::INTERNAL_SERVER_ERROR, Arc::default()).await;
    let mut auth = AuthStore::new(HttpAuthClient::new(&config(&base, None)).unwrap());

    auth.fetch_current_user().await;
    assert_eq!(auth.state().error.as_deref(), Some("Failed to fetch user"));

    auth.logout().await;
    assert_eq!(auth.state().error.as_deref(), Some("Failed to logout"));
    assert!(!auth.state().loading);
}

#[tokio::test]
async fn unreachable_backend_sets_error() {
    let mut auth = AuthStore::new(
        HttpAuthClient::new(&config("http://127.0.0.1:9", Some(SESSION))).unwrap(),
    );
    auth.fetch_current_user().await;
    assert_eq!(auth.state().error.as_deref(), Some("Failed to fetch user"));
}
