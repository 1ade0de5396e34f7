/*
[INPUT]:  Auth context and parsed subcommand arguments
[OUTPUT]: JSON documents describing the session or the endpoint response
[POS]:    CLI layer - subcommand implementations
[UPDATE]: When subcommands change
*/

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{info, warn};

use hikmalayer_auth::{
    AuthConfig, AuthContext, AuthError, JsonFileStore, ReconnectHint, RequestOptions,
    SessionState,
};

/// Restore the hinted session, or connect from scratch
async fn ensure_session(ctx: &AuthContext) -> Result<SessionState> {
    let state = ctx.session().restore().await.context("restore session")?;
    if state.is_connected() {
        info!("session restored from hint");
        return Ok(state);
    }
    let state = ctx.session().connect().await.context("connect wallet")?;
    if !state.is_connected() {
        bail!("wallet returned no accounts");
    }
    Ok(state)
}

pub async fn connect(ctx: &AuthContext) -> Result<Value> {
    let state = ensure_session(ctx).await?;
    Ok(serde_json::to_value(state)?)
}

pub async fn call(
    ctx: &AuthContext,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> Result<Value> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method {method}"))?;
    let body = body
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--body must be valid JSON")?;

    ensure_session(ctx).await?;

    let mut options = RequestOptions::get().with_method(method);
    if let Some(body) = body {
        options = options.with_body(body);
    }

    let response = match ctx.api().call(path, options).await {
        Ok(response) => response,
        Err(err @ AuthError::SessionRejected { .. }) => {
            warn!(error = %err, "server rejected the session; disconnecting");
            ctx.session().disconnect();
            return Err(err).context("protected call");
        }
        Err(err) => return Err(err).context("protected call"),
    };

    let text = response.text().await.context("read response body")?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

pub async fn sign(ctx: &AuthContext, message: &str) -> Result<Value> {
    let state = ensure_session(ctx).await?;
    let signature = ctx
        .session()
        .sign_message(message)
        .await
        .context("sign message")?;
    Ok(json!({
        "address": state.address.map(|address| address.to_string()),
        "signature": signature.as_str(),
    }))
}

pub async fn logout(ctx: &AuthContext) -> Result<Value> {
    ctx.session().restore().await.context("restore session")?;
    ctx.session().logout().await;
    Ok(serde_json::to_value(ctx.session().state())?)
}

pub fn status(config: &AuthConfig) -> Result<Value> {
    let hint_path = config.hint_path();
    let store = JsonFileStore::new(&hint_path);
    let hint = ReconnectHint::new(Arc::new(store));
    Ok(json!({
        "api_base_url": config.api_base_url,
        "hint_path": hint_path.display().to_string(),
        "address": hint.load().map(|address| address.to_string()),
    }))
}
