use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{assert_ok_response, non_blank, DescribeRequest, GenerateRequest, TattooProvider};
use crate::config::OpenAiConfig;

const VENDOR: &str = "OpenAI";
const END_USER_TAG: &str = "ink-it-app";

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<ChatChoice>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Option<Vec<ImageDatum>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

/// GPT-4o vision for describing, DALL-E for drawing.
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TattooProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn max_tokens(&self) -> u32 {
        self.config.max_tokens
    }

    async fn describe(&self, request: &DescribeRequest) -> Result<Option<String>> {
        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "model": self.config.vision_model,
                "messages": [
                    {"role": "system", "content": request.system},
                    {
                        "role": "user",
                        "content": [
                            {"type": "text", "text": request.question},
                            {"type": "image_url", "image_url": {"url": request.image.to_url()}}
                        ]
                    }
                ],
                "max_tokens": request.max_tokens,
            }))
            .send()
            .await?;

        let response = assert_ok_response(VENDOR, response).await?;
        let payload: ChatCompletionResponse = response.json().await?;
        if let Some(error) = payload.error.and_then(|err| err.message) {
            return Err(anyhow!("OpenAI returned an error: {error}"));
        }
        let content = payload
            .choices
            .and_then(|choices| choices.into_iter().next())
            .and_then(|choice| choice.message)
            .and_then(|msg| msg.content);
        Ok(non_blank(content))
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<Option<String>> {
        debug!(
            model = %self.config.image_model,
            size = %request.size,
            "requesting image generation"
        );
        let response = self
            .client
            .post(self.endpoint("images/generations"))
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "model": self.config.image_model,
                "prompt": request.prompt,
                "n": 1,
                "size": request.size,
                "quality": request.quality,
                "response_format": "url",
                "user": END_USER_TAG,
            }))
            .send()
            .await?;

        let response = assert_ok_response(VENDOR, response).await?;
        let payload: ImagesResponse = response.json().await?;
        if let Some(error) = payload.error.and_then(|err| err.message) {
            return Err(anyhow!("OpenAI returned an error: {error}"));
        }
        let url = payload
            .data
            .and_then(|data| data.into_iter().next())
            .and_then(|datum| datum.url);
        Ok(non_blank(url))
    }
}
