use anyhow::Result;
use tracing::{debug, warn};

use crate::normalize::ImagePayload;
use crate::providers::{DescribeRequest, TattooProvider};
use crate::styles::TattooStyle;

/// Returned when the vision model answers with nothing usable.
pub const FALLBACK_DESCRIPTION: &str = "abstract design";

const DESCRIBE_QUESTION: &str =
    "What are the key visual elements in this image that would be important for a tattoo design?";

pub fn system_instruction(style: TattooStyle) -> String {
    format!(
        "You are a tattoo artist specializing in {} style. \
Your task is to identify and describe the KEY ELEMENTS in the provided image with extreme precision. \
Focus on shapes, objects, subjects, composition, and critical visual details. \
Be extremely specific about what makes this image unique and recognizable. \
Your description will be used to create a tattoo that MUST reflect these key elements faithfully. \
Do not give generic or abstract descriptions. \
Keep your response under 200 words and focus exclusively on visual elements.",
        style.label()
    )
}

/// One vision call; never retried. Endpoint errors propagate.
pub async fn describe_image(
    provider: &dyn TattooProvider,
    image: &ImagePayload,
    style: TattooStyle,
) -> Result<String> {
    let request = DescribeRequest {
        system: system_instruction(style),
        question: DESCRIBE_QUESTION.to_string(),
        image: image.clone(),
        max_tokens: provider.max_tokens(),
    };
    match provider.describe(&request).await? {
        Some(description) if !description.trim().is_empty() => {
            debug!(provider = provider.name(), chars = description.len(), "image described");
            Ok(description)
        }
        _ => {
            warn!(
                provider = provider.name(),
                "vision model returned no description, using fallback"
            );
            Ok(FALLBACK_DESCRIPTION.to_string())
        }
    }
}
