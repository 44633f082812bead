//! Vision + image generation vendors behind one capability.
//!
//! The orchestrator only needs two calls: describe an image, and turn a prompt
//! into artwork. Each vendor module maps those onto its own wire format.

pub mod gemini;
pub mod openai;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::config::ProviderConfig;
use crate::normalize::ImagePayload;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

#[derive(Debug, Clone)]
pub struct DescribeRequest {
    pub system: String,
    pub question: String,
    pub image: ImagePayload,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub size: String,
    pub quality: String,
}

impl GenerateRequest {
    /// One high-quality square image.
    pub fn square_hd(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            size: "1024x1024".to_string(),
            quality: "hd".to_string(),
        }
    }
}

#[async_trait]
pub trait TattooProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Output-token cap this provider wants on describe calls.
    fn max_tokens(&self) -> u32;

    /// Returns the model's text, or `None` when the response carried none.
    async fn describe(&self, request: &DescribeRequest) -> Result<Option<String>>;

    /// Returns the artwork URL (remote or `data:`), or `None` when absent.
    async fn generate(&self, request: &GenerateRequest) -> Result<Option<String>>;
}

pub fn build_provider(config: &ProviderConfig, client: Client) -> Arc<dyn TattooProvider> {
    match config {
        ProviderConfig::OpenAi(openai) => Arc::new(OpenAiProvider::new(openai.clone(), client)),
        ProviderConfig::Gemini(gemini) => Arc::new(GeminiProvider::new(gemini.clone(), client)),
    }
}

pub(crate) async fn assert_ok_response(
    vendor: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    Err(anyhow!("{vendor} request failed: {status} {text}"))
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
