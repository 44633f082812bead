use std::sync::Arc;

use anyhow::Result;
use reqwest::Client;
use tracing::info;

use crate::config::Config;
use crate::pipeline::TattooPipeline;
use crate::profile::ProfileService;
use crate::providers::build_provider;
use crate::storage::LocalFileStorage;
use crate::store::build_stores;

/// Everything a request handler needs, wired once at startup.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: TattooPipeline,
    pub profiles: ProfileService,
    pub storage: Arc<LocalFileStorage>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder().build()?;
        let storage = Arc::new(LocalFileStorage::new(config.data_dir.clone(), config.files_url()));
        let provider = build_provider(&config.provider, client.clone());
        let stores = build_stores(&config.backend, &storage, client.clone());
        info!(
            provider = provider.name(),
            data_dir = %config.data_dir.display(),
            "application state ready"
        );
        let pipeline =
            TattooPipeline::new(provider, stores.images.clone(), storage.clone(), client);
        let profiles = ProfileService::new(stores.profiles, stores.images, storage.clone());
        Ok(Self {
            pipeline,
            profiles,
            storage,
        })
    }

    /// Public URL for a stored file, when the reference lives in our storage.
    pub fn public_url(&self, reference: &str) -> Option<String> {
        self.storage
            .key_for_reference(reference)
            .map(|key| self.storage.get_public_url(&key))
    }
}
