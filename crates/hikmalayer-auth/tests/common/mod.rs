/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for hikmalayer-auth tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use hikmalayer_auth::{
    AuthConfig, AuthContext, MemoryStore, MockSignerProvider, SessionManager, SessionState,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Context talking to `server`, with an in-memory hint store
pub fn test_context(
    server: &MockServer,
    provider: Arc<MockSignerProvider>,
    store: Arc<MemoryStore>,
) -> AuthContext {
    let config = AuthConfig {
        api_base_url: server.uri(),
        ..AuthConfig::default()
    };
    AuthContext::new(&config, provider, store).expect("context init")
}

/// Mount nonce and verify mocks issuing `nonce` and `token` for `address`
pub async fn mount_challenge(server: &MockServer, address: &str, nonce: &str, token: &str) {
    mount_challenge_with_delay(server, address, nonce, token, Duration::ZERO).await;
}

/// Same as [`mount_challenge`], with the verify answer held back by `delay`
pub async fn mount_challenge_with_delay(
    server: &MockServer,
    address: &str,
    nonce: &str,
    token: &str,
    delay: Duration,
) {
    Mock::given(method("POST"))
        .and(path("/auth/nonce"))
        .and(body_partial_json(serde_json::json!({ "address": address })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "nonce": nonce,
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/verify"))
        .and(body_partial_json(serde_json::json!({
            "address": address,
            "nonce": nonce,
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "token": token, "address": address }))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Wait until the session reaches a state matching `predicate`
pub async fn wait_for_state<F>(session: &SessionManager, predicate: F) -> SessionState
where
    F: Fn(&SessionState) -> bool,
{
    let mut rx = session.subscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let state = rx.borrow_and_update().clone();
            if predicate(&state) {
                return state;
            }
            rx.changed().await.expect("session dropped");
        }
    })
    .await
    .expect("timed out waiting for session state")
}
