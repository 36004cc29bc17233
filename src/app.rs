//! Process-wide context handed to every command.
//!
//! [`App`] owns the one [`SettingsStore`] instance and the transport client
//! built on top of it. Commands receive `&App` instead of reaching for
//! globals.

use std::sync::Arc;

use anyhow::{Context, Result};
use fehres_core::SettingsStore;

use crate::client::ApiClient;
use crate::config::Config;
use crate::storage::FileStorage;

pub struct App {
    pub config: Config,
    pub store: Arc<SettingsStore>,
    pub client: ApiClient,
}

impl App {
    /// Rehydrate the store from the configured state file and build the
    /// client. `api_url_override` (from `--api-url` / `FEHRES_API_URL`)
    /// applies to this process only.
    pub fn open(config: Config, api_url_override: Option<String>) -> Result<Self> {
        let storage = FileStorage::new(config.state.path.clone());
        tracing::debug!(path = %storage.path().display(), "opening state");
        let store = Arc::new(SettingsStore::open(Box::new(storage)));
        Self::with_store(config, store, api_url_override)
    }

    pub fn with_store(
        config: Config,
        store: Arc<SettingsStore>,
        api_url_override: Option<String>,
    ) -> Result<Self> {
        let client = ApiClient::new(&config, store.clone())
            .context("Failed to build HTTP client")?
            .with_api_url_override(api_url_override);
        Ok(Self {
            config,
            store,
            client,
        })
    }
}
