use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{assert_ok_response, non_blank, DescribeRequest, GenerateRequest, TattooProvider};
use crate::config::GeminiConfig;
use crate::normalize::{inline_bytes, ImagePayload};

const VENDOR: &str = "Gemini";

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PredictResponse {
    predictions: Option<Vec<Prediction>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

/// Gemini for describing, Imagen for drawing. Imagen answers with raw bytes,
/// so generated artwork comes back as a `data:` URL.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn model_endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{model}:{method}",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Gemini will not dereference image URLs, so remote sources are fetched here.
    async fn inline(&self, image: &ImagePayload) -> Result<(String, String)> {
        match image {
            ImagePayload::Inline { mime_type, data } => Ok((mime_type.clone(), data.clone())),
            ImagePayload::Remote(url) => {
                let response = self.client.get(url.as_str()).send().await?;
                let response = assert_ok_response("image fetch", response).await?;
                let bytes = response.bytes().await?;
                match inline_bytes(&bytes) {
                    ImagePayload::Inline { mime_type, data } => Ok((mime_type, data)),
                    ImagePayload::Remote(_) => Err(anyhow!("could not inline {url}")),
                }
            }
        }
    }
}

fn aspect_ratio(size: &str) -> &'static str {
    let parsed = size
        .split_once('x')
        .and_then(|(w, h)| Some((w.trim().parse::<u32>().ok()?, h.trim().parse::<u32>().ok()?)));
    match parsed {
        Some((w, h)) if w > h => "4:3",
        Some((w, h)) if w < h => "3:4",
        _ => "1:1",
    }
}

#[async_trait]
impl TattooProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn max_tokens(&self) -> u32 {
        self.config.max_tokens
    }

    async fn describe(&self, request: &DescribeRequest) -> Result<Option<String>> {
        let (mime_type, data) = self.inline(&request.image).await?;
        let response = self
            .client
            .post(self.model_endpoint(&self.config.vision_model, "generateContent"))
            .header("x-goog-api-key", &self.config.api_key)
            .json(&json!({
                "systemInstruction": {"parts": [{"text": request.system}]},
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"text": request.question},
                        {"inline_data": {"mime_type": mime_type, "data": data}}
                    ]
                }],
                "generationConfig": {"maxOutputTokens": request.max_tokens}
            }))
            .send()
            .await?;

        let response = assert_ok_response(VENDOR, response).await?;
        let payload: GenerateContentResponse = response.json().await?;
        let text: Option<String> = payload
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts)
            .map(|parts| {
                parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            });
        Ok(non_blank(text))
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<Option<String>> {
        debug!(model = %self.config.image_model, "requesting imagen prediction");
        let response = self
            .client
            .post(self.model_endpoint(&self.config.image_model, "predict"))
            .header("x-goog-api-key", &self.config.api_key)
            .json(&json!({
                "instances": [{"prompt": request.prompt}],
                "parameters": {
                    "sampleCount": 1,
                    "aspectRatio": aspect_ratio(&request.size)
                }
            }))
            .send()
            .await?;

        let response = assert_ok_response(VENDOR, response).await?;
        let payload: PredictResponse = response.json().await?;
        let url = payload
            .predictions
            .and_then(|predictions| predictions.into_iter().next())
            .and_then(|prediction| {
                let data = non_blank(prediction.bytes_base64_encoded)?;
                let mime_type = prediction.mime_type.unwrap_or_else(|| "image/png".to_string());
                Some(format!("data:{mime_type};base64,{data}"))
            });
        Ok(url)
    }
}
