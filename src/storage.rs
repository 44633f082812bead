use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::fs;
use uuid::Uuid;

pub const ORIGINALS_DIR: &str = "originals";
pub const TATTOOS_DIR: &str = "tattoos";

/// Device-local file area holding original photos and generated tattoos.
#[derive(Clone, Debug)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    base_url: String,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, base_url: String) -> Self {
        Self { base_dir, base_url }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve_path(key);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes `data` under `key` and returns the absolute path it landed at.
    /// Readers see either the previous content or the complete new file.
    pub async fn put(&self, key: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.resolve_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut staging = path.clone().into_os_string();
        staging.push(format!(".tmp-{}", Uuid::new_v4()));
        let staging = PathBuf::from(staging);
        fs::write(&staging, data).await?;
        if let Err(err) = fs::rename(&staging, &path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(err.into());
        }
        Ok(path)
    }

    pub async fn remove(&self, key: &str) -> Result<bool> {
        let path = self.resolve_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Removes a file by absolute reference, refusing anything outside the
    /// storage root. Returns `false` for foreign or already-missing files.
    pub async fn remove_reference(&self, reference: &str) -> Result<bool> {
        match self.key_for_reference(reference) {
            Some(key) => self.remove(&key).await,
            None => Ok(false),
        }
    }

    pub fn key_for_reference(&self, reference: &str) -> Option<String> {
        let path = Path::new(reference.strip_prefix("file://").unwrap_or(reference));
        let relative = path.strip_prefix(&self.base_dir).ok()?;
        let key = relative.to_string_lossy().replace('\\', "/");
        if key.is_empty() || key.split('/').any(|part| part == "..") {
            return None;
        }
        Some(key)
    }

    pub fn get_public_url(&self, key: &str) -> String {
        let trimmed = self.base_url.trim_end_matches('/');
        let key = key.trim_start_matches('/');
        format!("{trimmed}/{key}")
    }

    pub fn new_original_key(ext: &str) -> String {
        format!("{ORIGINALS_DIR}/{}.{ext}", Uuid::new_v4())
    }

    /// Tattoo files carry the id of the image they were generated from, so
    /// every generation for an image can be found again.
    pub fn new_tattoo_key(image_id: Uuid, ext: &str) -> String {
        format!("{TATTOOS_DIR}/{image_id}-{}.{ext}", Uuid::new_v4())
    }

    /// Deletes every tattoo file generated for `image_id`, including ones no
    /// record points at any more.
    pub async fn remove_tattoos_for(&self, image_id: Uuid) -> Result<usize> {
        let dir_path = self.resolve_path(TATTOOS_DIR);
        let mut dir = match fs::read_dir(&dir_path).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };
        let prefix = format!("{image_id}-");
        let mut removed = 0;
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_name().to_string_lossy().starts_with(&prefix) {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(removed)
    }

    pub fn resolve_path(&self, key: &str) -> PathBuf {
        let normalized = key.trim_start_matches('/');
        self.base_dir.join(Path::new(normalized))
    }
}
