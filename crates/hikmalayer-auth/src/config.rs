/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed authentication client configuration
[POS]:    Configuration layer - API location, timeouts, hint storage
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::http::{AuthError, ClientConfig, DEFAULT_API_BASE_URL, Result};

/// Configuration for the wallet authentication client
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Base URL of the node API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Total request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// File holding the reconnect hint
    #[serde(default)]
    pub hint_path: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            hint_path: None,
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl AuthConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AuthError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| AuthError::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.api_base_url)
            .map_err(|e| AuthError::Config(format!("invalid api_base_url: {e}")))?;
        if self.timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(AuthError::Config("timeouts must be positive".to_string()));
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }

    /// Reconnect-hint file; defaults to `<data dir>/hikmalayer/session.json`
    pub fn hint_path(&self) -> PathBuf {
        match &self.hint_path {
            Some(path) => path.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("hikmalayer")
                .join("session.json"),
        }
    }
}
