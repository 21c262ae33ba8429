//! Test fixtures and mock-server helpers for integration tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::fixtures::*;
//!
//! let server = MockServer::start().await;
//! mount_token(&server, "tok-1", 3600, 1).await;
//! let body = load_fixture_json("fedex/ship_delivered.json");
//! ```
#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tracking_day::carriers::FedexTracker;
use tracking_day::core::carrier::Carrier;
use tracking_day::core::token::TokenCache;
use tracking_day::make_token_response;
use tracking_day::storage::RawCredentials;

/// Client secret used by every mock-server test; must never show up in output.
pub const TEST_SECRET: &str = "fx-secret-do-not-print";
pub const TEST_CLIENT_ID: &str = "fx-client-id";

pub const TOKEN_PATH: &str = "/oauth/token";
pub const TRACK_PATH: &str = "/track/v1/trackingnumbers";
pub const SHIP_PATH: &str = "/ship/v1/trackingnumbers";

// =============================================================================
// Fixture Loading
// =============================================================================

fn fixtures_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir).join("tests/fixtures")
}

/// Load a JSON fixture from `tests/fixtures/`.
///
/// # Panics
///
/// Panics if the file cannot be read or parsed.
pub fn load_fixture_json(path: &str) -> Value {
    let full_path = fixtures_dir().join(path);
    let content = fs::read_to_string(&full_path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", full_path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", full_path.display(), e))
}

// =============================================================================
// Mock Server Helpers
// =============================================================================

/// Inline credentials pointing at `server`.
pub fn credentials_for(server: &MockServer) -> RawCredentials {
    RawCredentials::new(server.uri(), TEST_CLIENT_ID, TEST_SECRET)
}

/// FedEx client for `server` with a fresh token cache.
pub fn fedex_for(server: &MockServer) -> FedexTracker {
    fedex_with_cache(server, Arc::new(TokenCache::new()), Duration::from_secs(5))
}

pub fn fedex_with_cache(
    server: &MockServer,
    cache: Arc<TokenCache>,
    timeout: Duration,
) -> FedexTracker {
    let credentials = credentials_for(server)
        .validate(Carrier::Fedex, "test")
        .expect("valid test credentials");
    FedexTracker::new(credentials, "test", cache, timeout).expect("client build")
}

/// Token endpoint answering with `token`, expected to be hit `times` times.
pub async fn mount_token(server: &MockServer, token: &str, expires_in: u64, times: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(make_token_response(token, expires_in)))
        .expect(times)
        .mount(server)
        .await;
}

/// `endpoint_path` answering `status` with a JSON body, expected `times` times.
pub async fn mount_json(
    server: &MockServer,
    endpoint_path: &str,
    status: u16,
    body: Value,
    times: u64,
) {
    Mock::given(method("POST"))
        .and(path(endpoint_path))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}
