use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use tokio::fs;
use url::Url;

use crate::image_processing::detect_mime_type;

const FALLBACK_MIME: &str = "image/jpeg";

/// Where a source photo lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Local(PathBuf),
    Remote(Url),
    DataUrl(String),
}

impl ImageSource {
    pub fn parse(reference: &str) -> Result<Self> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("image reference is empty"));
        }
        if trimmed.starts_with("data:") {
            return Ok(ImageSource::DataUrl(trimmed.to_string()));
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            let url = Url::parse(trimmed).with_context(|| format!("invalid image url: {trimmed}"))?;
            return Ok(ImageSource::Remote(url));
        }
        let path = trimmed.strip_prefix("file://").unwrap_or(trimmed);
        Ok(ImageSource::Local(PathBuf::from(path)))
    }
}

/// Self-contained image content a vision endpoint can accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    Inline { mime_type: String, data: String },
    Remote(Url),
}

impl ImagePayload {
    pub fn to_url(&self) -> String {
        match self {
            ImagePayload::Inline { mime_type, data } => format!("data:{mime_type};base64,{data}"),
            ImagePayload::Remote(url) => url.to_string(),
        }
    }

    pub fn decode_inline(&self) -> Option<Result<Vec<u8>>> {
        match self {
            ImagePayload::Inline { data, .. } => Some(STANDARD.decode(data).map_err(Into::into)),
            ImagePayload::Remote(_) => None,
        }
    }
}

pub fn inline_bytes(bytes: &[u8]) -> ImagePayload {
    let mime_type = detect_mime_type(bytes).unwrap_or(FALLBACK_MIME);
    ImagePayload::Inline {
        mime_type: mime_type.to_string(),
        data: STANDARD.encode(bytes),
    }
}

pub fn parse_data_url(raw: &str) -> Result<ImagePayload> {
    let rest = raw
        .strip_prefix("data:")
        .ok_or_else(|| anyhow!("not a data url"))?;
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("data url has no payload"))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| anyhow!("only base64 data urls are supported"))?;
    let mime_type = if mime_type.is_empty() { FALLBACK_MIME } else { mime_type };
    Ok(ImagePayload::Inline {
        mime_type: mime_type.to_string(),
        data: data.to_string(),
    })
}

pub async fn normalize(source: &ImageSource) -> Result<ImagePayload> {
    match source {
        ImageSource::Local(path) => {
            let bytes = fs::read(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(inline_bytes(&bytes))
        }
        ImageSource::Remote(url) => Ok(ImagePayload::Remote(url.clone())),
        ImageSource::DataUrl(raw) => parse_data_url(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_classifies_references() {
        assert_eq!(
            ImageSource::parse("file:///tmp/cat.jpg").unwrap(),
            ImageSource::Local(PathBuf::from("/tmp/cat.jpg"))
        );
        assert!(matches!(
            ImageSource::parse("https://cdn.example.com/cat.jpg").unwrap(),
            ImageSource::Remote(_)
        ));
        assert!(matches!(
            ImageSource::parse("data:image/png;base64,AAAA").unwrap(),
            ImageSource::DataUrl(_)
        ));
        assert!(ImageSource::parse("   ").is_err());
    }

    #[tokio::test]
    async fn local_file_round_trips_through_base64() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        let bytes = crate::image_processing::sample_png(4, 4);
        std::fs::write(&path, &bytes).unwrap();

        let payload = normalize(&ImageSource::Local(path)).await.unwrap();
        assert!(payload.to_url().starts_with("data:image/png;base64,"));
        assert_eq!(payload.decode_inline().unwrap().unwrap(), bytes);
    }

    #[tokio::test]
    async fn unknown_bytes_default_to_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let payload = normalize(&ImageSource::Local(path)).await.unwrap();
        assert!(matches!(
            payload,
            ImagePayload::Inline { ref mime_type, .. } if mime_type == "image/jpeg"
        ));
    }

    #[tokio::test]
    async fn missing_file_propagates_error() {
        let missing = ImageSource::Local(PathBuf::from("/definitely/not/here.jpg"));
        let result = normalize(&missing).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn remote_url_passes_through() {
        let source = ImageSource::parse("https://cdn.example.com/cat.jpg").unwrap();
        let payload = normalize(&source).await.unwrap();
        assert_eq!(payload.to_url(), "https://cdn.example.com/cat.jpg");
    }

    #[test]
    fn data_url_splits_into_inline() {
        let payload = parse_data_url("data:image/webp;base64,UklGRg==").unwrap();
        assert_eq!(
            payload,
            ImagePayload::Inline {
                mime_type: "image/webp".to_string(),
                data: "UklGRg==".to_string()
            }
        );
        assert!(parse_data_url("data:text/plain,hello").is_err());
    }
}
