//! Shared fixtures for infra integration tests

#![allow(dead_code)]

use std::sync::Arc;

use magicbox_domain::Config;
use magicbox_infra::auth::SessionEventHub;
use magicbox_infra::{HostedAuthClient, HttpClient};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const ANON_KEY: &str = "anon-test-key";

/// Client that fails fast instead of backing off between attempts.
pub fn http_client() -> HttpClient {
    HttpClient::builder()
        .max_attempts(1)
        .api_key(ANON_KEY)
        .expect("anon key should be a valid header")
        .build()
        .expect("http client should build")
}

pub fn auth_client(server: &MockServer) -> Arc<HostedAuthClient> {
    Arc::new(
        HostedAuthClient::new(http_client(), &server.uri(), SessionEventHub::new())
            .expect("auth client should build"),
    )
}

/// Development config pointed at the mock backend.
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.backend.url = server.uri();
    config.backend.anon_key = ANON_KEY.to_string();
    config
}

/// `POST /auth/v1/token` response body.
pub fn token_body(access_token: &str, user_id: &str, email: Option<&str>) -> Value {
    json!({
        "access_token": access_token,
        "refresh_token": format!("refresh-{access_token}"),
        "token_type": "bearer",
        "expires_in": 3600,
        "user": {
            "id": user_id,
            "email": email,
            "user_metadata": {}
        }
    })
}

/// One row of the `users` table.
pub fn profile_row(id: &str, email: Option<&str>, name: &str) -> Value {
    json!({
        "id": id,
        "email": email,
        "name": name,
        "avatar_url": null,
        "role": "user",
        "created_at": "2026-01-05T10:00:00Z",
        "updated_at": "2026-01-05T10:00:00Z"
    })
}
