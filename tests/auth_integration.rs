use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::Arc;

use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::header::{COOKIE, SET_COOKIE};
use serde_json::{json, Value};
use tokengate::auth::{AuthService, Claims, MIN_COST};
use tokengate::configuration::{HttpSettings, JwtSettings};
use tokengate::domain::Credentials;
use tokengate::startup::run;
use tokengate::store::InMemoryUserStore;
use tokengate::telemetry;

const SECRET: &str = "integration-secret";

pub struct TestApp {
    pub address: String,
    pub auth: AuthService,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.address, path)
    }
}

async fn spawn_app() -> TestApp {
    // Only the first call in this binary installs the subscriber
    telemetry::try_init_telemetry();

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let auth = AuthService::new(
        JwtSettings {
            secret: SECRET.to_string(),
            access_token_ttl: 60,
            refresh_token_ttl: 3600,
        },
        Arc::new(InMemoryUserStore::new()),
    )
    .with_hash_cost(MIN_COST);
    auth.create_user(Credentials::new("admin", "admin-pass"))
        .await
        .expect("Failed to seed user");

    let server = run(listener, auth.clone(), HttpSettings::default())
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp { address, auth }
}

fn set_cookies(response: &reqwest::Response) -> HashMap<String, String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .collect()
}

fn cookie_header(access: &str, refresh: &str) -> String {
    format!("access={}; refresh={}", access, refresh)
}

fn expired_token(login: &str) -> String {
    let mut claims = Claims::new(login, chrono::Duration::minutes(1)).unwrap();
    claims.exp = chrono::Utc::now().timestamp() - 60;
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

// --- Login / Logout ---

#[tokio::test]
async fn login_returns_tokens_and_cookies() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .post(&app.url("/login?login=admin&password=admin-pass"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let cookies = set_cookies(&response);
    let body: Value = response.json().await.expect("Failed to parse response");

    assert_eq!(body["status_code"], 200);
    assert_eq!(body["access_token"].as_str(), cookies.get("access").map(String::as_str));
    assert_eq!(body["refresh_token"].as_str(), cookies.get("refresh").map(String::as_str));
    assert_eq!(app.auth.validate_token(&cookies["access"]).unwrap(), "admin");
}

#[tokio::test]
async fn login_accepts_json_body() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .post(&app.url("/login"))
        .json(&json!({"login": "admin", "password": "admin-pass"}))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let test_cases = vec![
        (json!({"login": "ghost", "password": "x"}), 404, "unknown login"),
        (json!({"login": "admin", "password": "wrong"}), 403, "wrong password"),
        (json!({"login": "admin"}), 400, "missing password"),
    ];

    for (body, expected, description) in test_cases {
        let response = client
            .post(&app.url("/login"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(expected, response.status().as_u16(), "Case: {}", description);
        assert!(set_cookies(&response).is_empty(), "Case: {}", description);
    }
}

#[tokio::test]
async fn logout_clears_cookies() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .get(&app.url("/logout"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let cookies = set_cookies(&response);
    assert_eq!(cookies.get("access").map(String::as_str), Some(""));
    assert_eq!(cookies.get("refresh").map(String::as_str), Some(""));
}

// --- Token gate ---

#[tokio::test]
async fn gate_accepts_live_access_token() {
    let app = spawn_app().await;
    let tokens = app.auth.issue_pair("admin").unwrap();

    for path in ["/i", "/validate"] {
        let response = reqwest::Client::new()
            .get(&app.url(path))
            .header(COOKIE, cookie_header(&tokens.access_token, &tokens.refresh_token))
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(200, response.status().as_u16());
        assert!(set_cookies(&response).is_empty());
        let body: Value = response.json().await.unwrap();
        assert!(body["message"].as_str().unwrap().contains("admin"));
    }
}

#[tokio::test]
async fn gate_rotates_tokens_when_access_expired() {
    let app = spawn_app().await;
    let tokens = app.auth.issue_pair("admin").unwrap();

    let response = reqwest::Client::new()
        .get(&app.url("/i"))
        .header(COOKIE, cookie_header(&expired_token("admin"), &tokens.refresh_token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let cookies = set_cookies(&response);
    assert_eq!(app.auth.validate_token(&cookies["access"]).unwrap(), "admin");
    assert_eq!(app.auth.validate_token(&cookies["refresh"]).unwrap(), "admin");
}

#[tokio::test]
async fn gate_rejects_invalid_tokens() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&app.url("/i"))
        .header(COOKIE, cookie_header(&expired_token("admin"), &expired_token("admin")))
        .header("X-Request-ID", "req-77")
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(403, response.status().as_u16());
    assert_eq!(
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-77")
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "TOKEN_EXPIRED");
    assert_eq!(body["error_id"], "req-77");

    let response = client
        .get(&app.url("/i"))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn login_then_use_cookies_on_gate() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&app.url("/login?login=admin&password=admin-pass"))
        .send()
        .await
        .expect("Failed to execute request.");
    let cookies = set_cookies(&response);

    let response = client
        .get(&app.url("/i"))
        .header(COOKIE, cookie_header(&cookies["access"], &cookies["refresh"]))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
}

// --- User CRUD ---

#[tokio::test]
async fn user_crud_round_trip() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&app.url("/user"))
        .json(&json!({"login": "bob", "password": "first"}))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(201, response.status().as_u16());

    let response = client
        .get(&app.url("/user/bob"))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["login"], "bob");
    assert!(body.get("password").is_none());

    let response = client
        .put(&app.url("/user"))
        .json(&json!({"login": "bob", "password": "second"}))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let response = client
        .post(&app.url("/login"))
        .json(&json!({"login": "bob", "password": "second"}))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let response = client
        .delete(&app.url("/user/bob"))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let response = client
        .get(&app.url("/user/bob"))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn create_user_conflicts_on_duplicate_login() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .post(&app.url("/user"))
        .json(&json!({"login": "admin", "password": "again"}))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(409, response.status().as_u16());
}

// --- RPC validation ---

#[tokio::test]
async fn rpc_validate_reports_all_three_outcomes() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let tokens = app.auth.issue_pair("admin").unwrap();

    let response = client
        .post(&app.url("/rpc/validate"))
        .json(&json!({"access_token": tokens.access_token, "refresh_token": tokens.refresh_token}))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "valid-no-update");
    assert_eq!(body["login"], "admin");
    assert_eq!(body["is_update"], false);

    let response = client
        .post(&app.url("/rpc/validate"))
        .json(&json!({"access_token": expired_token("admin"), "refresh_token": tokens.refresh_token}))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "valid-updated");
    assert_eq!(body["is_update"], true);
    let rotated = body["access_token"].as_str().unwrap();
    assert_eq!(app.auth.validate_token(rotated).unwrap(), "admin");

    let response = client
        .post(&app.url("/rpc/validate"))
        .json(&json!({"access_token": "bad", "refresh_token": "bad"}))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(403, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "invalid");
    assert_eq!(body["success"], false);
}
