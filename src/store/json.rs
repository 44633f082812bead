use anyhow::Result;
use async_trait::async_trait;
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use super::{ImageStore, ProfileStore};
use crate::records::{ImageRecord, Profile, TattooUpdate};
use crate::storage::LocalFileStorage;

const IMAGE_DIR: &str = "records/images";
const PROFILE_DIR: &str = "records/profiles";

/// On-device record store: one pretty-printed JSON file per row.
#[derive(Clone, Debug)]
pub struct JsonRecordStore {
    storage: LocalFileStorage,
}

impl JsonRecordStore {
    pub fn new(storage: LocalFileStorage) -> Self {
        Self { storage }
    }

    fn image_key(id: Uuid) -> String {
        format!("{IMAGE_DIR}/{id}.json")
    }

    fn profile_key(user_id: &str) -> String {
        format!("{PROFILE_DIR}/{}.json", file_safe(user_id))
    }

    async fn write_image(&self, record: &ImageRecord) -> Result<()> {
        let payload = serde_json::to_vec_pretty(record)?;
        self.storage.put(&Self::image_key(record.id), &payload).await?;
        Ok(())
    }

    async fn all_images(&self) -> Result<Vec<ImageRecord>> {
        let dir_path = self.storage.resolve_path(IMAGE_DIR);
        let mut dir = match fs::read_dir(&dir_path).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut records = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(&path).await?;
            match serde_json::from_slice::<ImageRecord>(&bytes) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable image record")
                }
            }
        }
        Ok(records)
    }
}

/// Keeps user ids usable as file names without collisions.
fn file_safe(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("_{byte:02x}"));
        }
    }
    out
}

#[async_trait]
impl ImageStore for JsonRecordStore {
    async fn insert_image(&self, record: &ImageRecord) -> Result<()> {
        self.write_image(record).await
    }

    async fn get_image(&self, id: Uuid) -> Result<Option<ImageRecord>> {
        match self.storage.get(&Self::image_key(id)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn list_images(&self, user_id: &str) -> Result<Vec<ImageRecord>> {
        let mut records: Vec<ImageRecord> = self
            .all_images()
            .await?
            .into_iter()
            .filter(|record| record.user_id == user_id)
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn mark_processed(
        &self,
        id: Uuid,
        user_id: &str,
        update: &TattooUpdate,
    ) -> Result<Option<ImageRecord>> {
        let mut record = match self.get_image(id).await? {
            Some(record) if record.user_id == user_id => record,
            _ => return Ok(None),
        };
        record.apply(update);
        self.write_image(&record).await?;
        Ok(Some(record))
    }

    async fn delete_images(&self, user_id: &str) -> Result<Vec<ImageRecord>> {
        let owned = self.list_images(user_id).await?;
        for record in &owned {
            self.storage.remove(&Self::image_key(record.id)).await?;
        }
        Ok(owned)
    }
}

#[async_trait]
impl ProfileStore for JsonRecordStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        match self.storage.get(&Self::profile_key(user_id)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        let payload = serde_json::to_vec_pretty(profile)?;
        self.storage.put(&Self::profile_key(&profile.id), &payload).await?;
        Ok(())
    }
}
