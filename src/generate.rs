use anyhow::{anyhow, Result};
use tracing::debug;

use crate::providers::{GenerateRequest, TattooProvider};
use crate::styles::TattooStyle;

/// Final text-to-image prompt: the description wrapped in reproduction
/// instructions, followed by the style template.
pub fn enhanced_prompt(style: TattooStyle, description: &str) -> String {
    let label = style.label();
    format!(
        "IMPORTANT: Create a tattoo design in the {label} style that FAITHFULLY REPRODUCES \
these specific elements from the original image:\n\n\
{description}\n\n\
The design MUST be immediately recognizable as derived from the original image while \
applying the {label} style aesthetics.\n\n\
{template}\n\n\
CRITICAL: The subject matter and composition MUST closely match the original image - \
do NOT create a generic design.",
        description = description.trim(),
        template = style.prompt(),
    )
}

pub async fn generate_tattoo_url(
    provider: &dyn TattooProvider,
    style: TattooStyle,
    description: &str,
) -> Result<String> {
    let prompt = enhanced_prompt(style, description);
    debug!(provider = provider.name(), style = style.label(), "submitting generation prompt");
    provider
        .generate(&GenerateRequest::square_hd(prompt))
        .await?
        .ok_or_else(|| anyhow!("{} returned no image url", provider.name()))
}
