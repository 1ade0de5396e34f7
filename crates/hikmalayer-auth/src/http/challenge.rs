/*
[INPUT]:  Wallet address, signed challenge message and nonce
[OUTPUT]: Single-use nonces and session tokens
[POS]:    HTTP layer - nonce challenge endpoints (/auth/nonce, /auth/verify, /auth/logout)
[UPDATE]: When auth endpoints or verification error mapping change
*/

use reqwest::{Method, StatusCode};
use tracing::debug;

use crate::http::client::{decode_json, error_body};
use crate::http::{ApiClient, AuthError, Result};
use crate::types::{
    Address, Nonce, NonceRequest, NonceResponse, SessionToken, Signature, VerifyRequest,
    VerifyResponse,
};

const NONCE_ENDPOINT: &str = "/auth/nonce";
const VERIFY_ENDPOINT: &str = "/auth/verify";
const LOGOUT_ENDPOINT: &str = "/auth/logout";

/// Client for the nonce challenge protocol
#[derive(Debug, Clone)]
pub struct ChallengeClient {
    client: ApiClient,
}

impl ChallengeClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Step 1: request a single-use nonce for an address
    ///
    /// POST /auth/nonce
    pub async fn request_nonce(&self, address: &Address) -> Result<Nonce> {
        let body = NonceRequest {
            address: address.to_string(),
        };

        let builder = self.client.request(Method::POST, NONCE_ENDPOINT)?.json(&body);
        let response = self.client.send(builder).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::server_error(status, error_body(response).await));
        }

        let payload: NonceResponse = decode_json(response).await?;
        if payload.nonce.is_empty() {
            return Err(AuthError::InvalidResponse("server issued an empty nonce".to_string()));
        }
        debug!(address = %address, "nonce issued");
        Ok(Nonce::new(payload.nonce))
    }

    /// Step 2: submit the signed challenge and obtain a session token
    ///
    /// POST /auth/verify
    ///
    /// Bad signatures, mismatched addresses and stale nonces are not
    /// distinguishable here; they all surface as `VerificationRejected`
    /// carrying whatever the server put in the body.
    pub async fn verify(
        &self,
        address: &Address,
        message: &str,
        signature: &Signature,
        nonce: &Nonce,
    ) -> Result<SessionToken> {
        let body = VerifyRequest {
            address: address.to_string(),
            message: message.to_string(),
            signature: signature.as_str().to_string(),
            nonce: nonce.as_str().to_string(),
        };

        let builder = self.client.request(Method::POST, VERIFY_ENDPOINT)?.json(&body);
        let response = self.client.send(builder).await?;
        let status = response.status();
        if is_rejection(status) {
            let body = error_body(response).await;
            return Err(AuthError::VerificationRejected {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }
        if !status.is_success() {
            return Err(AuthError::server_error(status, error_body(response).await));
        }

        let payload: VerifyResponse = decode_json(response).await?;
        if let Some(reported) = payload.address.as_deref() {
            let reported = Address::new(reported);
            if &reported != address {
                return Err(AuthError::VerificationRejected {
                    status: status.as_u16(),
                    body: format!("server bound the session to {reported}, expected {address}"),
                });
            }
        }
        if payload.token.is_empty() {
            return Err(AuthError::InvalidResponse("server issued an empty token".to_string()));
        }
        Ok(SessionToken::new(payload.token))
    }

    /// Best-effort server-side session invalidation
    ///
    /// DELETE /auth/logout
    pub async fn logout(&self, token: &SessionToken) -> Result<()> {
        let builder = self
            .client
            .request(Method::DELETE, LOGOUT_ENDPOINT)?
            .bearer_auth(token.expose());
        let response = self.client.send(builder).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::server_error(status, error_body(response).await));
        }
        Ok(())
    }
}

fn is_rejection(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::http::ClientConfig;

    fn client_for(server: &MockServer) -> ChallengeClient {
        let api = ApiClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
            .expect("client init");
        ChallengeClient::new(api)
    }

    #[tokio::test]
    async fn test_request_nonce() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/nonce"))
            .and(body_json(serde_json::json!({ "address": "0xaa" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "nonce": "N1",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let nonce = client_for(&server)
            .request_nonce(&Address::new("0xAA"))
            .await
            .unwrap();
        assert_eq!(nonce, Nonce::new("N1"));
    }

    #[tokio::test]
    async fn test_request_nonce_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/nonce"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .request_nonce(&Address::new("0xaa"))
            .await
            .unwrap_err();
        match err {
            AuthError::Server { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_request_nonce_network_error() {
        // Nothing listens on port 9 locally.
        let api = ApiClient::with_config_and_base_url(ClientConfig::default(), "http://127.0.0.1:9")
            .unwrap();
        let err = ChallengeClient::new(api)
            .request_nonce(&Address::new("0xaa"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Network(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_request_nonce_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/nonce"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .request_nonce(&Address::new("0xaa"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_verify_returns_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/verify"))
            .and(body_json(serde_json::json!({
                "address": "0xaa",
                "message": "msg",
                "signature": "SIG1",
                "nonce": "N1",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "TOK1",
                "address": "0xAA",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = client_for(&server)
            .verify(
                &Address::new("0xaa"),
                "msg",
                &Signature::new("SIG1"),
                &Nonce::new("N1"),
            )
            .await
            .unwrap();
        assert_eq!(token.expose(), "TOK1");
    }

    #[rstest]
    #[case(400)]
    #[case(401)]
    #[case(403)]
    #[tokio::test]
    async fn test_verify_rejections_share_one_kind(#[case] status: u16) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/verify"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .verify(
                &Address::new("0xaa"),
                "msg",
                &Signature::new("SIG1"),
                &Nonce::new("N1"),
            )
            .await
            .unwrap_err();
        match err {
            AuthError::VerificationRejected { status: got, body } => {
                assert_eq!(got, status);
                assert!(body.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_verify_server_error_is_not_a_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/verify"))
            .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .verify(
                &Address::new("0xaa"),
                "msg",
                &Signature::new("SIG1"),
                &Nonce::new("N1"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Server { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_verify_address_mismatch_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "TOK1",
                "address": "0xbb",
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .verify(
                &Address::new("0xaa"),
                "msg",
                &Signature::new("SIG1"),
                &Nonce::new("N1"),
            )
            .await
            .unwrap_err();
        match err {
            AuthError::VerificationRejected { status, body } => {
                assert_eq!(status, 200);
                assert!(body.contains("0xbb"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_logout_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/auth/logout"))
            .and(header("authorization", "Bearer TOK1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "message": "Successfully logged out",
            })))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .logout(&SessionToken::new("TOK1"))
            .await
            .unwrap();
    }
}
