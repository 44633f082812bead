use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::records::Profile;
use crate::storage::LocalFileStorage;
use crate::store::{ImageStore, ProfileStore};

#[derive(Debug, Default, Clone)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ResetSummary {
    pub records_removed: usize,
    pub files_removed: usize,
}

#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn ProfileStore>,
    images: Arc<dyn ImageStore>,
    storage: Arc<LocalFileStorage>,
}

impl ProfileService {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        images: Arc<dyn ImageStore>,
        storage: Arc<LocalFileStorage>,
    ) -> Self {
        Self {
            profiles,
            images,
            storage,
        }
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<Profile>> {
        self.profiles.get_profile(user_id).await
    }

    /// Only the fields that are set are changed; blank strings are ignored.
    pub async fn update(&self, user_id: &str, changes: ProfileChanges) -> Result<Profile> {
        let mut profile = self
            .profiles
            .get_profile(user_id)
            .await?
            .unwrap_or_else(|| Profile::empty(user_id));
        if let Some(username) = changes.username.filter(|value| !value.trim().is_empty()) {
            profile.username = Some(username.trim().to_string());
        }
        if let Some(avatar_url) = changes.avatar_url.filter(|value| !value.trim().is_empty()) {
            profile.avatar_url = Some(avatar_url.trim().to_string());
        }
        profile.updated_at = Some(Utc::now());
        self.profiles.upsert_profile(&profile).await?;
        Ok(profile)
    }

    /// Clears the profile and deletes every image the user owns, records and
    /// local files alike. Files outside the storage root are left alone.
    pub async fn reset(&self, user_id: &str) -> Result<ResetSummary> {
        let mut profile = Profile::empty(user_id);
        profile.updated_at = Some(Utc::now());
        self.profiles.upsert_profile(&profile).await?;

        let removed = self.images.delete_images(user_id).await?;
        let mut files_removed = 0;
        for record in &removed {
            let references =
                std::iter::once(&record.original_ref).chain(record.tattoo_ref.as_ref());
            for reference in references {
                match self.storage.remove_reference(reference).await {
                    Ok(true) => files_removed += 1,
                    Ok(false) => {}
                    Err(err) => {
                        warn!(image_id = %record.id, error = %err, "could not remove image file")
                    }
                }
            }
            match self.storage.remove_tattoos_for(record.id).await {
                Ok(count) => files_removed += count,
                Err(err) => {
                    warn!(image_id = %record.id, error = %err, "could not sweep tattoo files")
                }
            }
        }
        info!(user_id, records = removed.len(), files = files_removed, "profile reset");
        Ok(ResetSummary {
            records_removed: removed.len(),
            files_removed,
        })
    }
}
