//! Remote store factory for creating store instances from configuration.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use log::warn;

use super::{FakeRemoteTaskStore, RemoteTaskStore, RestRemoteTaskStore};
use crate::config::RemoteConfig;

/// Create the remote store selected by `config.backend`.
///
/// # Errors
/// Returns error if:
/// - Backend type is unknown
/// - The rest backend has no base URL or API key
pub fn create_remote_store(config: &RemoteConfig) -> Result<Arc<dyn RemoteTaskStore>> {
    match config.backend.as_str() {
        "fake" => Ok(Arc::new(FakeRemoteTaskStore::new())),
        "rest" => {
            let base_url = config
                .base_url
                .as_deref()
                .ok_or_else(|| anyhow!("Missing 'base_url' for the rest backend"))?;
            let api_key = config
                .api_key()
                .ok_or_else(|| anyhow!("Environment variable {} is not set", config.api_key_env))?;

            let access_token = config.access_token();
            if access_token.is_none() {
                warn!(
                    "⚠️ {} is not set; remote calls will fail until a session token is provided",
                    config.access_token_env
                );
            }

            Ok(Arc::new(RestRemoteTaskStore::new(base_url, api_key, access_token)))
        }
        _ => Err(anyhow!("Unknown backend type: {}", config.backend)),
    }
}
