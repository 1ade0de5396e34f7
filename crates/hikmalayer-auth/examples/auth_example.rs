/*
[INPUT]:  Local private key and a running Hikmalayer node
[OUTPUT]: Authenticated session and one protected call
[POS]:    Examples - wallet authentication flow demonstration
[UPDATE]: When the session flow changes
*/

use std::sync::Arc;

use hikmalayer_auth::*;

/// Example: wallet authentication flow
///
/// 1. Build a context from the default configuration
/// 2. Try a silent restore from the reconnect hint
/// 3. Connect the wallet (nonce, sign, verify)
/// 4. Call a protected endpoint with the session token
/// 5. Log out
#[tokio::main]
async fn main() {
    println!("=== Hikmalayer Authentication Example ===\n");

    // Well-known development key; never use it with real funds
    let key = std::env::var("HIKMALAYER_PRIVATE_KEY").unwrap_or_else(|_| {
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string()
    });
    let provider = match LocalKeyProvider::new(&key) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            eprintln!("Invalid private key: {}", e);
            return;
        }
    };
    println!("✓ Wallet loaded: {}", provider.address());

    let config = AuthConfig::default();
    let ctx = match AuthContext::new(&config, provider, Arc::new(MemoryStore::new())) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Failed to create context: {}", e);
            return;
        }
    };
    println!("✓ Context created for {}", config.api_base_url);

    if let Ok(state) = ctx.session().restore().await {
        println!("  Restore result: {}", state.status);
    }

    match ctx.session().connect().await {
        Ok(state) => println!("✓ Session: {} ({:?})", state.status, state.address),
        Err(e) => {
            eprintln!("Authentication failed: {}", e);
            return;
        }
    }

    match ctx
        .api()
        .call_json::<serde_json::Value>("/api/balance", RequestOptions::get())
        .await
    {
        Ok(body) => println!("✓ Protected call: {}", body),
        Err(AuthError::SessionRejected { status }) => {
            println!("  Session rejected ({}); disconnecting", status);
            ctx.session().disconnect();
        }
        Err(e) => println!("  Protected call failed: {}", e),
    }

    ctx.session().logout().await;
    println!("\n✓ Authentication example complete");
}
