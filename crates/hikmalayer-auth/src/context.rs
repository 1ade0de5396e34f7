/*
[INPUT]:  Configuration, wallet provider and hint store
[OUTPUT]: Session manager and authenticated client sharing one session
[POS]:    Crate root helper - explicit context passed to consumers
[UPDATE]: When consumers need new collaborators from the auth stack
*/

use std::sync::Arc;

use crate::auth::{SessionManager, SignerProvider};
use crate::config::AuthConfig;
use crate::http::{ApiClient, AuthenticatedClient, ChallengeClient, Result};
use crate::storage::{JsonFileStore, KeyValueStore};

/// Everything a consumer needs to authenticate and call protected endpoints
#[derive(Clone)]
pub struct AuthContext {
    session: SessionManager,
    api: AuthenticatedClient,
}

impl AuthContext {
    pub fn new(
        config: &AuthConfig,
        provider: Arc<dyn SignerProvider>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        config.validate()?;
        let client =
            ApiClient::with_config_and_base_url(config.client_config(), &config.api_base_url)?;
        let session = SessionManager::new(provider, ChallengeClient::new(client.clone()), store);
        let api = AuthenticatedClient::new(client, session.handle());
        Ok(Self { session, api })
    }

    /// Context persisting the reconnect hint to the configured file
    pub fn from_config(config: &AuthConfig, provider: Arc<dyn SignerProvider>) -> Result<Self> {
        let store = Arc::new(JsonFileStore::new(config.hint_path()));
        Self::new(config, provider, store)
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn api(&self) -> &AuthenticatedClient {
        &self.api
    }
}
