use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use tracing::{info, warn};
use uuid::Uuid;

use crate::image_processing::{extension_for_mime, inspect_image};
use crate::normalize::parse_data_url;
use crate::providers::assert_ok_response;
use crate::records::{ImageRecord, TattooUpdate};
use crate::storage::LocalFileStorage;
use crate::store::ImageStore;

/// Fetches generated artwork. Providers that hand back raw bytes use `data:`
/// URLs, which are decoded in place.
pub async fn download_image(client: &Client, url: &str) -> Result<Vec<u8>> {
    if url.starts_with("data:") {
        return parse_data_url(url)?
            .decode_inline()
            .ok_or_else(|| anyhow!("data url did not carry inline bytes"))?;
    }
    let response = client
        .get(url)
        .send()
        .await
        .context("download of generated image failed")?;
    let response = assert_ok_response("image download", response).await?;
    Ok(response.bytes().await?.to_vec())
}

/// Stores the artwork under a fresh id and performs the single record update.
/// The file is removed again when the update does not land; once it does, the
/// tattoo the record used to point at is deleted.
pub async fn materialize(
    client: &Client,
    storage: &LocalFileStorage,
    images: &dyn ImageStore,
    record: &ImageRecord,
    generated_url: &str,
    style: &str,
) -> Result<(PathBuf, ImageRecord)> {
    let bytes = download_image(client, generated_url).await?;
    let info = inspect_image(&bytes).context("generated artwork is not a usable image")?;
    let key = LocalFileStorage::new_tattoo_key(record.id, extension_for_mime(&info.mime_type));
    let path = storage.put(&key, &bytes).await?;

    let update = TattooUpdate {
        tattoo_ref: path.to_string_lossy().to_string(),
        style: style.to_string(),
    };
    let outcome = images.mark_processed(record.id, &record.user_id, &update).await;
    match outcome {
        Ok(Some(updated)) => {
            info!(
                image_id = %record.id,
                width = info.width,
                height = info.height,
                bytes = info.size,
                "tattoo stored"
            );
            if let Some(previous) = record.tattoo_ref.as_deref() {
                replace_previous(storage, previous, record.id).await;
            }
            Ok((path, updated))
        }
        Ok(None) => {
            discard(storage, &key, record.id).await;
            Err(anyhow!("image record {} no longer exists", record.id))
        }
        Err(err) => {
            discard(storage, &key, record.id).await;
            Err(err.context("failed to update the image record"))
        }
    }
}

async fn discard(storage: &LocalFileStorage, key: &str, image_id: Uuid) {
    if let Err(err) = storage.remove(key).await {
        warn!(%image_id, key, error = %err, "could not remove orphaned tattoo file");
    }
}

async fn replace_previous(storage: &LocalFileStorage, previous: &str, image_id: Uuid) {
    if let Err(err) = storage.remove_reference(previous).await {
        warn!(%image_id, previous, error = %err, "could not remove replaced tattoo file");
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::get};
    use base64::{Engine, engine::general_purpose::STANDARD};

    use super::*;
    use crate::store::JsonRecordStore;
    use crate::test_support::spawn_router;

    fn setup(dir: &std::path::Path) -> (LocalFileStorage, JsonRecordStore) {
        let storage =
            LocalFileStorage::new(dir.to_path_buf(), "http://localhost/files".to_string());
        (storage.clone(), JsonRecordStore::new(storage))
    }

    async fn tattoo_files(storage: &LocalFileStorage) -> usize {
        match std::fs::read_dir(storage.resolve_path(crate::storage::TATTOOS_DIR)) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    #[tokio::test]
    async fn data_url_is_decoded_and_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let (storage, store) = setup(dir.path());
        let record = ImageRecord::new("alice", "/x.jpg");
        store.insert_image(&record).await.unwrap();

        let png = crate::image_processing::sample_png(2, 2);
        let url = format!("data:image/png;base64,{}", STANDARD.encode(&png));
        let (path, updated) = materialize(&Client::new(), &storage, &store, &record, &url, "Tribal")
            .await
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), png);
        assert!(path.extension().is_some_and(|ext| ext == "png"));
        assert!(updated.processed);
        assert_eq!(updated.tattoo_ref.as_deref(), Some(path.to_string_lossy().as_ref()));
    }

    #[tokio::test]
    async fn http_download_is_fetched() {
        let png = crate::image_processing::sample_png(1, 1);
        let served = png.clone();
        let router = Router::new().route(
            "/t.png",
            get(move || {
                let bytes = served.clone();
                async move { bytes }
            }),
        );
        let base = spawn_router(router).await;

        let bytes = download_image(&Client::new(), &format!("{base}/t.png")).await.unwrap();
        assert_eq!(bytes, png);
    }

    #[tokio::test]
    async fn failed_download_writes_nothing() {
        let router = Router::new().route("/gone.png", get(|| async { StatusCode::NOT_FOUND }));
        let base = spawn_router(router).await;
        let dir = tempfile::tempdir().unwrap();
        let (storage, store) = setup(dir.path());
        let record = ImageRecord::new("alice", "/x.jpg");
        store.insert_image(&record).await.unwrap();

        let url = format!("{base}/gone.png");
        let outcome = materialize(&Client::new(), &storage, &store, &record, &url, "Tribal").await;
        assert!(outcome.is_err());
        assert_eq!(tattoo_files(&storage).await, 0);
        assert_eq!(store.get_image(record.id).await.unwrap().unwrap(), record);
    }

    #[tokio::test]
    async fn missing_record_removes_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let (storage, store) = setup(dir.path());
        let record = ImageRecord::new("alice", "/x.jpg");

        let png = crate::image_processing::sample_png(2, 2);
        let url = format!("data:image/png;base64,{}", STANDARD.encode(&png));
        let err = materialize(&Client::new(), &storage, &store, &record, &url, "Tribal")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no longer exists"));
        assert_eq!(tattoo_files(&storage).await, 0);
    }

    #[tokio::test]
    async fn non_image_payload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (storage, store) = setup(dir.path());
        let record = ImageRecord::new("alice", "/x.jpg");
        store.insert_image(&record).await.unwrap();

        let url = format!("data:image/png;base64,{}", STANDARD.encode(b"<html></html>"));
        let outcome = materialize(&Client::new(), &storage, &store, &record, &url, "Tribal").await;
        assert!(outcome.is_err());
        assert_eq!(tattoo_files(&storage).await, 0);
    }

    #[tokio::test]
    async fn regeneration_replaces_previous_tattoo_file() {
        let dir = tempfile::tempdir().unwrap();
        let (storage, store) = setup(dir.path());
        let record = ImageRecord::new("alice", "/x.jpg");
        store.insert_image(&record).await.unwrap();
        let url = format!(
            "data:image/png;base64,{}",
            STANDARD.encode(crate::image_processing::sample_png(2, 2))
        );

        let client = Client::new();
        let (first, updated) =
            materialize(&client, &storage, &store, &record, &url, "Tribal").await.unwrap();
        let (second, _) =
            materialize(&client, &storage, &store, &updated, &url, "Realism").await.unwrap();

        assert!(!first.exists());
        assert!(second.exists());
        assert_eq!(tattoo_files(&storage).await, 1);
        let stored = store.get_image(record.id).await.unwrap().unwrap();
        assert_eq!(stored.tattoo_ref.as_deref(), Some(second.to_string_lossy().as_ref()));
        assert_eq!(stored.style.as_deref(), Some("Realism"));
    }
}
