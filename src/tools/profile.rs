use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::JsonSchema,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::profile::ProfileChanges;
use crate::records::Profile;
use crate::tools::{json_success, validation::{internal, require_user_id}};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProfileRequest {
    #[schemars(description = "ID of the signed-in user")]
    pub user_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateProfileRequest {
    #[schemars(description = "ID of the signed-in user")]
    pub user_id: String,
    #[schemars(description = "New display name")]
    pub username: Option<String>,
    #[schemars(description = "New avatar image URL")]
    pub avatar_url: Option<String>,
}

pub async fn get_profile(
    state: &AppState,
    Parameters(request): Parameters<ProfileRequest>,
) -> Result<CallToolResult, McpError> {
    let user_id = require_user_id(&request.user_id)?;
    let profile = state
        .profiles
        .get(user_id)
        .await
        .map_err(|err| internal("load profile failed", format!("{err:#}")))?
        .unwrap_or_else(|| Profile::empty(user_id));
    json_success(&profile)
}

pub async fn update_profile(
    state: &AppState,
    Parameters(request): Parameters<UpdateProfileRequest>,
) -> Result<CallToolResult, McpError> {
    let user_id = require_user_id(&request.user_id)?;
    let profile = state
        .profiles
        .update(
            user_id,
            ProfileChanges {
                username: request.username,
                avatar_url: request.avatar_url,
            },
        )
        .await
        .map_err(|err| internal("update profile failed", format!("{err:#}")))?;
    json_success(&profile)
}

pub async fn reset_profile(
    state: &AppState,
    Parameters(request): Parameters<ProfileRequest>,
) -> Result<CallToolResult, McpError> {
    let user_id = require_user_id(&request.user_id)?;
    let summary = state
        .profiles
        .reset(user_id)
        .await
        .map_err(|err| internal("reset profile failed", format!("{err:#}")))?;
    json_success(&summary)
}
