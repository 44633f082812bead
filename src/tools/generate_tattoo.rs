use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars::JsonSchema,
};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::records::GenerationRequest;
use crate::styles::DEFAULT_STYLE_ID;
use crate::tools::{to_json, validation::{parse_image_id, require_user_id}};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateTattooRequest {
    #[schemars(description = "ID of the signed-in user who owns the photo")]
    pub user_id: String,
    #[schemars(description = "image_id returned by submit_image")]
    pub image_id: String,
    #[schemars(
        description = "Traditional, Realism, Neo-Traditional, Japanese, Tribal or Minimalist. Unknown values use Minimalist"
    )]
    pub style: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateTattooResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tattoo_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tattoo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn generate_tattoo(
    state: &AppState,
    Parameters(request): Parameters<GenerateTattooRequest>,
) -> Result<CallToolResult, McpError> {
    let user_id = require_user_id(&request.user_id)?;
    let image_id = parse_image_id(&request.image_id)?;
    let style = request
        .style
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_STYLE_ID.to_string());

    let result = state
        .pipeline
        .generate(&GenerationRequest {
            user_id: user_id.to_string(),
            image_id,
            style,
        })
        .await;

    let response = GenerateTattooResponse {
        success: result.success,
        tattoo_url: result.tattoo_ref.as_deref().and_then(|r| state.public_url(r)),
        tattoo_ref: result.tattoo_ref,
        error: result.error,
    };
    let json = to_json(&response)?;
    if response.success {
        Ok(CallToolResult::success(vec![Content::text(json)]))
    } else {
        Ok(CallToolResult::error(vec![Content::text(json)]))
    }
}
