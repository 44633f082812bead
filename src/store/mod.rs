pub mod json;
pub mod postgrest;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use uuid::Uuid;

use crate::config::BackendConfig;
use crate::records::{ImageRecord, Profile, TattooUpdate};
use crate::storage::LocalFileStorage;

pub use json::JsonRecordStore;
pub use postgrest::PostgrestStore;

/// The `images` table.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn insert_image(&self, record: &ImageRecord) -> Result<()>;

    async fn get_image(&self, id: Uuid) -> Result<Option<ImageRecord>>;

    /// Newest first.
    async fn list_images(&self, user_id: &str) -> Result<Vec<ImageRecord>>;

    /// Single point write keyed by `(id, user_id)`. `None` means no row matched
    /// and nothing was written.
    async fn mark_processed(
        &self,
        id: Uuid,
        user_id: &str,
        update: &TattooUpdate,
    ) -> Result<Option<ImageRecord>>;

    /// Removes every record owned by `user_id` and returns what was removed.
    async fn delete_images(&self, user_id: &str) -> Result<Vec<ImageRecord>>;
}

/// The `profiles` table.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>>;

    async fn upsert_profile(&self, profile: &Profile) -> Result<()>;
}

pub struct Stores {
    pub images: Arc<dyn ImageStore>,
    pub profiles: Arc<dyn ProfileStore>,
}

pub fn build_stores(backend: &BackendConfig, storage: &LocalFileStorage, client: Client) -> Stores {
    match backend {
        BackendConfig::Local => {
            let store = Arc::new(JsonRecordStore::new(storage.clone()));
            Stores {
                images: store.clone(),
                profiles: store,
            }
        }
        BackendConfig::Supabase { url, anon_key } => {
            let store = Arc::new(PostgrestStore::new(url, anon_key, client));
            Stores {
                images: store.clone(),
                profiles: store,
            }
        }
    }
}
