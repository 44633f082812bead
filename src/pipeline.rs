//! Tattoo generation orchestrator.
//!
//! `normalize -> describe -> prompt -> generate -> materialize`, strictly in
//! that order. The first failing stage ends the run; [`TattooPipeline::generate`]
//! turns every failure into a [`GenerationResult`] instead of an error.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use tracing::{info, instrument, warn};

use crate::describe::describe_image;
use crate::error::PipelineError;
use crate::generate::generate_tattoo_url;
use crate::image_processing::{extension_for_mime, inspect_image};
use crate::materialize::materialize;
use crate::normalize::{normalize, ImagePayload, ImageSource};
use crate::providers::TattooProvider;
use crate::records::{GenerationRequest, GenerationResult, ImageRecord};
use crate::storage::LocalFileStorage;
use crate::store::ImageStore;
use crate::styles::TattooStyle;

#[derive(Clone)]
pub struct TattooPipeline {
    provider: Arc<dyn TattooProvider>,
    images: Arc<dyn ImageStore>,
    storage: Arc<LocalFileStorage>,
    http: Client,
}

impl TattooPipeline {
    pub fn new(
        provider: Arc<dyn TattooProvider>,
        images: Arc<dyn ImageStore>,
        storage: Arc<LocalFileStorage>,
        http: Client,
    ) -> Self {
        Self {
            provider,
            images,
            storage,
            http,
        }
    }

    pub fn images(&self) -> &Arc<dyn ImageStore> {
        &self.images
    }

    pub fn storage(&self) -> &Arc<LocalFileStorage> {
        &self.storage
    }

    /// Registers a photo for `user_id`. Local and inline sources are copied
    /// into storage so the record never points at a file the caller may delete;
    /// remote URLs are recorded as given.
    pub async fn submit_image(&self, user_id: &str, reference: &str) -> Result<ImageRecord> {
        let source = ImageSource::parse(reference)?;
        match source {
            ImageSource::Remote(url) => self.insert(user_id, url.to_string()).await,
            ImageSource::Local(_) | ImageSource::DataUrl(_) => {
                let payload = normalize(&source).await?;
                let bytes = payload
                    .decode_inline()
                    .ok_or_else(|| anyhow!("source did not produce inline bytes"))?
                    .context("source is not valid base64")?;
                self.submit_bytes(user_id, &bytes).await
            }
        }
    }

    /// Stores an uploaded photo. Bytes that do not decode as an image are
    /// refused before anything is written.
    pub async fn submit_bytes(&self, user_id: &str, bytes: &[u8]) -> Result<ImageRecord> {
        if bytes.is_empty() {
            return Err(anyhow!("image is empty"));
        }
        let info = inspect_image(bytes).context("source is not a supported image")?;
        let key = LocalFileStorage::new_original_key(extension_for_mime(&info.mime_type));
        let path = self.storage.put(&key, bytes).await?;
        match self.insert(user_id, path.to_string_lossy().to_string()).await {
            Ok(record) => Ok(record),
            Err(err) => {
                if let Err(cleanup) = self.storage.remove(&key).await {
                    warn!(user_id, key, error = %cleanup, "could not remove orphaned original");
                }
                Err(err)
            }
        }
    }

    async fn insert(&self, user_id: &str, original_ref: String) -> Result<ImageRecord> {
        let record = ImageRecord::new(user_id, original_ref);
        self.images.insert_image(&record).await?;
        info!(user_id, image_id = %record.id, "image submitted");
        Ok(record)
    }

    /// Runs one generation. Never fails: errors come back as `success=false`.
    #[instrument(
        skip(self, request),
        fields(user_id = %request.user_id, image_id = %request.image_id, style = %request.style)
    )]
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        match self.run(request).await {
            Ok(tattoo_ref) => {
                info!(tattoo_ref = %tattoo_ref, "tattoo generated");
                GenerationResult::succeeded(tattoo_ref)
            }
            Err(err) => {
                warn!(stage = err.stage(), error = %err, "tattoo generation failed");
                GenerationResult::failed(err.to_string())
            }
        }
    }

    async fn run(&self, request: &GenerationRequest) -> Result<String, PipelineError> {
        let record = self
            .images
            .get_image(request.image_id)
            .await
            .map_err(PipelineError::Lookup)?
            .filter(|record| record.user_id == request.user_id)
            .ok_or(PipelineError::ImageNotFound(request.image_id))?;

        let style = TattooStyle::resolve(&request.style);
        let payload = self.normalize(&record).await.map_err(PipelineError::Normalize)?;
        let description = describe_image(self.provider.as_ref(), &payload, style)
            .await
            .map_err(PipelineError::Describe)?;
        let url = generate_tattoo_url(self.provider.as_ref(), style, &description)
            .await
            .map_err(PipelineError::Generate)?;
        let (path, _) = materialize(
            &self.http,
            &self.storage,
            self.images.as_ref(),
            &record,
            &url,
            style.label(),
        )
        .await
        .map_err(PipelineError::Materialize)?;
        Ok(path.to_string_lossy().to_string())
    }

    async fn normalize(&self, record: &ImageRecord) -> Result<ImagePayload> {
        let source = ImageSource::parse(&record.original_ref)?;
        normalize(&source).await
    }
}
