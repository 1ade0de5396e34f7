/*
[INPUT]:  Session handle and protected endpoint requests
[OUTPUT]: Responses from protected endpoints, authorization failures classified
[POS]:    HTTP layer - bearer-authenticated calls on behalf of the session
[UPDATE]: When protected call options or failure classification change
*/

use reqwest::header::AUTHORIZATION;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::SessionHandle;
use crate::http::client::{decode_json, error_body};
use crate::http::{ApiClient, AuthError, Result};

/// Options for a protected call
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: Vec::new(),
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Extra header; an `Authorization` header here is ignored in favour
    /// of the session token
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Client for protected endpoints
///
/// Reads the token from the session on every call and never keeps a copy.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    client: ApiClient,
    session: SessionHandle,
}

impl AuthenticatedClient {
    pub fn new(client: ApiClient, session: SessionHandle) -> Self {
        Self { client, session }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Perform a protected call
    ///
    /// Fails with `NotAuthenticated` before touching the network when the
    /// session is not connected. A 401/403 answer is `SessionRejected`;
    /// deciding whether to disconnect is left to the caller.
    pub async fn call(&self, endpoint: &str, options: RequestOptions) -> Result<Response> {
        let Some(token) = self.session.bearer_token() else {
            debug!(endpoint, "protected call without a session");
            return Err(AuthError::NotAuthenticated);
        };

        let mut builder = self
            .client
            .request(options.method, endpoint)?
            .bearer_auth(token.expose());
        for (name, value) in &options.headers {
            if name.eq_ignore_ascii_case(AUTHORIZATION.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        let response = self.client.send(builder).await?;
        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            warn!(endpoint, status = status.as_u16(), "session rejected by server");
            return Err(AuthError::SessionRejected {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(AuthError::server_error(status, error_body(response).await));
        }
        Ok(response)
    }

    /// Perform a protected call and decode the JSON body
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let response = self.call(endpoint, options).await?;
        decode_json(response).await
    }
}
