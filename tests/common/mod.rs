// Shared helpers for integration tests
#![allow(dead_code)]

use chrono::Duration;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;

use chirpy::auth::{AuthService, DEFAULT_REFRESH_TOKEN_TTL_DAYS};
use chirpy::configuration::AuthSettings;
use chirpy::memory::{InMemoryRefreshTokenStore, InMemoryUserRepository};
use chirpy::startup::run;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-characters-long";

pub fn test_auth_settings() -> AuthSettings {
    AuthSettings {
        secret: TEST_SECRET.to_string(),
        refresh_token_ttl_days: DEFAULT_REFRESH_TOKEN_TTL_DAYS,
        // Minimum bcrypt cost keeps the suite fast
        bcrypt_cost: 4,
    }
}

pub fn test_auth_service(refresh_tokens: InMemoryRefreshTokenStore) -> AuthService {
    AuthService::new(
        test_auth_settings(),
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(refresh_tokens),
    )
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub refresh_tokens: InMemoryRefreshTokenStore,
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(false, Duration::days(DEFAULT_REFRESH_TOKEN_TTL_DAYS))
}

pub fn spawn_app_with(reset_enabled: bool, refresh_token_ttl: Duration) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let refresh_tokens = InMemoryRefreshTokenStore::new(refresh_token_ttl);
    let auth_service = test_auth_service(refresh_tokens.clone());

    let server = run(listener, auth_service, reset_enabled).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        refresh_tokens,
    }
}

impl TestApp {
    pub async fn create_user(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/users", &self.address))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        expires_in_seconds: Option<i64>,
    ) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/login", &self.address))
            .json(&json!({
                "email": email,
                "password": password,
                "expires_in_seconds": expires_in_seconds
            }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register and log in, returning the login body
    pub async fn signed_in_user(&self, email: &str, password: &str) -> Value {
        assert_eq!(201, self.create_user(email, password).await.status().as_u16());
        let response = self.login(email, password, None).await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse login response")
    }

    pub async fn update_user(&self, token: &str, email: &str, password: &str) -> reqwest::Response {
        self.client
            .put(&format!("{}/api/users", &self.address))
            .bearer_auth(token)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn refresh(&self, refresh_token: Option<&str>) -> reqwest::Response {
        let mut request = self.client.post(&format!("{}/api/refresh", &self.address));
        if let Some(token) = refresh_token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn revoke(&self, refresh_token: Option<&str>) -> reqwest::Response {
        let mut request = self.client.post(&format!("{}/api/revoke", &self.address));
        if let Some(token) = refresh_token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request.")
    }
}

/// Error body without the per-request id and timestamp
pub async fn error_kind(response: reqwest::Response) -> (u16, String, String) {
    let status = response.status().as_u16();
    let body: Value = response.json().await.expect("Failed to parse error body");
    (
        status,
        body["code"].as_str().unwrap_or_default().to_string(),
        body["message"].as_str().unwrap_or_default().to_string(),
    )
}
