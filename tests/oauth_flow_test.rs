//! Integration tests for the Google sign-in bridge against a mocked provider.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;
use ugc_blog::config::Config;
use ugc_blog::db::{get_login_attempt_by_state_hash, Database, LoginAttemptStatus};
use ugc_blog::auth::hash_state_token;
use ugc_blog::web::{create_app, AppState};
use wiremock::matchers::{body_string_contains, header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn oauth_config(mock_uri: &str) -> Config {
    Config {
        google_client_id: Some("client-123".to_string()),
        google_client_secret: Some("secret-456".to_string()),
        google_token_url: format!("{mock_uri}/token"),
        google_userinfo_url: format!("{mock_uri}/userinfo"),
        ..Config::for_testing()
    }
}

async fn setup_app(config: Config) -> (Router, Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = Database::new(&temp_dir.path().join("test.sqlite"))
        .await
        .expect("Failed to create database");
    let state = AppState::new(config, db.clone()).expect("Failed to build state");
    (create_app(state).expect("Failed to build app"), db, temp_dir)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, location, String::from_utf8(body.to_vec()).unwrap())
}

/// Start a login and return the state token from the consent redirect.
async fn start_login(app: &Router, uri: &str) -> String {
    let (status, location, _) = get(app, uri).await;
    assert_eq!(status, StatusCode::FOUND);

    let location = url::Url::parse(&location.expect("redirect without Location")).unwrap();
    location
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .expect("consent URL without state")
}

async fn mount_provider(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=good-code"))
        .and(body_string_contains("client_secret=secret-456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-789",
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .and(header_eq("authorization", "Bearer access-789"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "1234567890",
            "name": "Ada Lovelace",
            "picture": "https://lh3.example.com/ada.png",
            "email": "ada@example.com"
        })))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_login_redirects_to_consent_screen() {
    let mock_server = MockServer::start().await;
    let (app, db, _temp_dir) = setup_app(oauth_config(&mock_server.uri())).await;

    let (status, location, _) = get(&app, "/auth/google").await;
    assert_eq!(status, StatusCode::FOUND);

    let location = url::Url::parse(&location.unwrap()).unwrap();
    assert_eq!(location.host_str(), Some("accounts.google.com"));
    let params: std::collections::HashMap<_, _> = location.query_pairs().into_owned().collect();
    assert_eq!(params["client_id"], "client-123");
    assert_eq!(params["redirect_uri"], "http://localhost:5001/auth/google/callback");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["scope"], "profile email");

    // Only the hash of the state is stored.
    let attempt = get_login_attempt_by_state_hash(db.pool(), &hash_state_token(&params["state"]))
        .await
        .unwrap()
        .expect("login attempt not recorded");
    assert_eq!(attempt.status_enum(), Some(LoginAttemptStatus::Pending));
}

#[tokio::test]
async fn test_callback_without_code_is_400() {
    let mock_server = MockServer::start().await;
    let (app, _db, _temp_dir) = setup_app(oauth_config(&mock_server.uri())).await;

    let (status, _, body) = get(&app, "/auth/google/callback").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "No code");

    let (status, _, _) = get(&app, "/auth/google/callback?code=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_relays_profile_to_opener() {
    let mock_server = MockServer::start().await;
    mount_provider(&mock_server).await;
    let (app, db, _temp_dir) = setup_app(oauth_config(&mock_server.uri())).await;

    let state = start_login(&app, "/auth/google?nonce=opener-42").await;

    let (status, _, page) =
        get(&app, &format!("/auth/google/callback?code=good-code&state={state}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains(r#""type":"GOOGLE_LOGIN_SUCCESS""#));
    assert!(page.contains(r#""displayName":"Ada Lovelace""#));
    assert!(page.contains(r#""photoURL":"https://lh3.example.com/ada.png""#));
    assert!(page.contains(r#""email":"ada@example.com""#));
    assert!(page.contains(r#""nonce":"opener-42""#));
    assert!(page.contains(r#"postMessage(message, "http://localhost:3000")"#));

    let attempt = get_login_attempt_by_state_hash(db.pool(), &hash_state_token(&state))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(attempt.status_enum(), Some(LoginAttemptStatus::Resolved));
}

#[tokio::test]
async fn test_state_cannot_be_replayed() {
    let mock_server = MockServer::start().await;
    mount_provider(&mock_server).await;
    let (app, _db, _temp_dir) = setup_app(oauth_config(&mock_server.uri())).await;

    let state = start_login(&app, "/auth/google").await;
    let callback = format!("/auth/google/callback?code=good-code&state={state}");

    let (status, _, _) = get(&app, &callback).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, page) = get(&app, &callback).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(page.contains("Error. Close and try again."));
    assert!(!page.contains("GOOGLE_LOGIN_SUCCESS"));
}

#[tokio::test]
async fn test_callback_rejects_missing_or_unknown_state() {
    let mock_server = MockServer::start().await;
    mount_provider(&mock_server).await;
    let (app, _db, _temp_dir) = setup_app(oauth_config(&mock_server.uri())).await;

    let (status, _, page) = get(&app, "/auth/google/callback?code=good-code").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!page.contains("GOOGLE_LOGIN_SUCCESS"));

    let (status, _, page) =
        get(&app, "/auth/google/callback?code=good-code&state=forged").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!page.contains("GOOGLE_LOGIN_SUCCESS"));
}

#[tokio::test]
async fn test_expired_state_is_rejected() {
    let mock_server = MockServer::start().await;
    mount_provider(&mock_server).await;
    let config = Config {
        login_attempt_ttl: Duration::from_millis(1),
        ..oauth_config(&mock_server.uri())
    };
    let (app, _db, _temp_dir) = setup_app(config).await;

    let state = start_login(&app, "/auth/google").await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let (status, _, page) =
        get(&app, &format!("/auth/google/callback?code=good-code&state={state}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(page.contains("Error. Close and try again."));
}

#[tokio::test]
async fn test_token_exchange_failure_shows_generic_page() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})),
        )
        .mount(&mock_server)
        .await;
    let (app, _db, _temp_dir) = setup_app(oauth_config(&mock_server.uri())).await;

    let state = start_login(&app, "/auth/google").await;
    let (status, _, page) =
        get(&app, &format!("/auth/google/callback?code=bad-code&state={state}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("Error. Close and try again."));
    assert!(!page.contains("invalid_grant"));
}

#[tokio::test]
async fn test_profile_fetch_failure_shows_generic_page() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "access-789"})),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;
    let (app, _db, _temp_dir) = setup_app(oauth_config(&mock_server.uri())).await;

    let state = start_login(&app, "/auth/google").await;
    let (status, _, page) =
        get(&app, &format!("/auth/google/callback?code=good-code&state={state}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("Error. Close and try again."));
}

#[tokio::test]
async fn test_provider_error_shows_generic_page() {
    let mock_server = MockServer::start().await;
    let (app, _db, _temp_dir) = setup_app(oauth_config(&mock_server.uri())).await;

    let (status, _, page) = get(&app, "/auth/google/callback?error=access_denied").await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("Error. Close and try again."));
}

#[tokio::test]
async fn test_missing_secret_fails_exchange() {
    let mock_server = MockServer::start().await;
    mount_provider(&mock_server).await;
    let config = Config {
        google_client_secret: None,
        ..oauth_config(&mock_server.uri())
    };
    let (app, _db, _temp_dir) = setup_app(config).await;

    let state = start_login(&app, "/auth/google").await;
    let (status, _, page) =
        get(&app, &format!("/auth/google/callback?code=good-code&state={state}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("Error. Close and try again."));
    assert!(!page.contains("GOOGLE_LOGIN_SUCCESS"));
}
