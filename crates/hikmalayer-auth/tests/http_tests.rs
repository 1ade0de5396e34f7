/*
[INPUT]:  Mock HTTP responses
[OUTPUT]: Test results for the challenge and authenticated clients
[POS]:    Integration tests - HTTP endpoints
[UPDATE]: When HTTP endpoints or failure classification change
*/

mod common;

use std::sync::Arc;

use common::{mount_challenge, setup_mock_server, test_context};
use hikmalayer_auth::{
    Address, ApiClient, AuthError, ChallengeClient, ClientConfig, MemoryStore,
    MockSignerProvider, Nonce, RequestOptions, Signature,
};
use rstest::rstest;
use tokio_test::assert_ok;
use wiremock::matchers::{any, body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn challenge_client(uri: &str) -> ChallengeClient {
    let api = assert_ok!(ApiClient::with_config_and_base_url(ClientConfig::default(), uri));
    ChallengeClient::new(api)
}

fn wallet() -> Arc<MockSignerProvider> {
    Arc::new(MockSignerProvider::new(&["0xaa"]).with_signature("0xaa", "SIG1"))
}

#[test]
fn test_client_creation() {
    let client = assert_ok!(ApiClient::new());
    assert_eq!(client.base_url().as_str(), "http://127.0.0.1:3000/");
}

#[test]
fn test_invalid_base_url() {
    let result = ApiClient::with_config_and_base_url(ClientConfig::default(), "not a url");
    assert!(matches!(result, Err(AuthError::UrlParse(_))));
}

#[tokio::test]
async fn test_nonce_is_single_use() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/auth/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "TOK1",
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/verify"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "nonce already used",
        })))
        .mount(&server)
        .await;

    let client = challenge_client(&server.uri());
    let address = Address::new("0xaa");
    let nonce = Nonce::new("N1");
    let signature = Signature::new("SIG1");

    let token = assert_ok!(client.verify(&address, "msg", &signature, &nonce).await);
    assert_eq!(token.expose(), "TOK1");

    let err = client
        .verify(&address, "msg", &signature, &nonce)
        .await
        .unwrap_err();
    assert!(
        matches!(err, AuthError::VerificationRejected { status: 400, ref body } if body.contains("nonce already used"))
    );
}

#[tokio::test]
async fn test_nonce_request_body() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/auth/nonce"))
        .and(body_json(serde_json::json!({ "address": "0xaa" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "nonce": "N1",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let nonce = assert_ok!(
        challenge_client(&server.uri())
            .request_nonce(&Address::new(" 0xAA "))
            .await
    );
    assert_eq!(nonce.as_str(), "N1");
}

#[tokio::test]
async fn test_call_without_session_sends_nothing() {
    let server = setup_mock_server().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let ctx = test_context(&server, wallet(), Arc::new(MemoryStore::new()));

    let err = ctx
        .api()
        .call("/api/balance", RequestOptions::get())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotAuthenticated));
}

#[tokio::test]
async fn test_call_attaches_bearer_token() {
    let server = setup_mock_server().await;
    mount_challenge(&server, "0xaa", "N1", "TOK1").await;
    Mock::given(method("POST"))
        .and(path("/api/transfer"))
        .and(header("authorization", "Bearer TOK1"))
        .and(header("x-trace", "t-1"))
        .and(body_json(serde_json::json!({ "to": "0xbb", "amount": 50 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
        })))
        .expect(1)
        .mount(&server)
        .await;
    let ctx = test_context(&server, wallet(), Arc::new(MemoryStore::new()));
    assert_ok!(ctx.session().connect().await);

    let options = RequestOptions::post(serde_json::json!({ "to": "0xbb", "amount": 50 }))
        .with_header("x-trace", "t-1")
        .with_header("Authorization", "Bearer forged");
    let body: serde_json::Value = assert_ok!(ctx.api().call_json("/api/transfer", options).await);
    assert_eq!(body["ok"], true);
}

#[rstest]
#[case(401)]
#[case(403)]
#[tokio::test]
async fn test_call_session_rejected(#[case] status: u16) {
    let server = setup_mock_server().await;
    mount_challenge(&server, "0xaa", "N1", "TOK1").await;
    Mock::given(method("GET"))
        .and(path("/api/balance"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    let ctx = test_context(&server, wallet(), Arc::new(MemoryStore::new()));
    assert_ok!(ctx.session().connect().await);

    let err = ctx
        .api()
        .call("/api/balance", RequestOptions::get())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SessionRejected { status: s } if s == status));
    assert!(err.is_auth_error());
    // Disconnecting is the caller's decision.
    assert!(ctx.session().handle().is_connected());
}

#[tokio::test]
async fn test_call_server_error() {
    let server = setup_mock_server().await;
    mount_challenge(&server, "0xaa", "N1", "TOK1").await;
    Mock::given(method("GET"))
        .and(path("/api/balance"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
        .mount(&server)
        .await;
    let ctx = test_context(&server, wallet(), Arc::new(MemoryStore::new()));
    assert_ok!(ctx.session().connect().await);

    let err = ctx
        .api()
        .call("/api/balance", RequestOptions::get())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Server { status: 502, ref body } if body == "upstream down"));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_call_after_logout_is_unauthenticated() {
    let server = setup_mock_server().await;
    mount_challenge(&server, "0xaa", "N1", "TOK1").await;
    Mock::given(method("DELETE"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    let ctx = test_context(&server, wallet(), Arc::new(MemoryStore::new()));
    assert_ok!(ctx.session().connect().await);

    ctx.session().logout().await;

    let err = ctx
        .api()
        .call("/api/balance", RequestOptions::get())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotAuthenticated));
}
