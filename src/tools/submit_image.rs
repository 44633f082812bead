use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::JsonSchema,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::normalize::ImageSource;
use crate::tools::{json_success, validation::{internal, require_user_id}};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SubmitImageRequest {
    #[schemars(description = "ID of the signed-in user who owns the photo")]
    pub user_id: String,
    #[schemars(description = "Photo to convert: http(s) URL or base64 data: URL")]
    pub source: String,
}

#[derive(Debug, Serialize)]
struct SubmitImageResponse {
    image_id: Uuid,
    original_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_url: Option<String>,
}

pub async fn submit_image(
    state: &AppState,
    Parameters(request): Parameters<SubmitImageRequest>,
) -> Result<CallToolResult, McpError> {
    let user_id = require_user_id(&request.user_id)?;
    match ImageSource::parse(&request.source) {
        Ok(ImageSource::Local(_)) => {
            return Err(McpError::invalid_params(
                "source must be an http(s) or data: URL; use the upload page for local files",
                None,
            ));
        }
        Ok(_) => {}
        Err(err) => return Err(McpError::invalid_params(format!("{err:#}"), None)),
    }
    let record = state
        .pipeline
        .submit_image(user_id, &request.source)
        .await
        .map_err(|err| internal("submit image failed", format!("{err:#}")))?;

    json_success(&SubmitImageResponse {
        image_id: record.id,
        original_url: state.public_url(&record.original_ref),
        original_ref: record.original_ref,
    })
}
