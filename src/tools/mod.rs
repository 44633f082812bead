pub mod generate_tattoo;
pub mod list_images;
pub mod list_styles;
pub mod profile;
pub mod submit_image;
pub mod validation;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

pub use generate_tattoo::{generate_tattoo, GenerateTattooRequest};
pub use list_images::{list_images, ListImagesRequest};
pub use list_styles::list_styles;
pub use profile::{get_profile, reset_profile, update_profile, ProfileRequest, UpdateProfileRequest};
pub use submit_image::{submit_image, SubmitImageRequest};

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string(value)
        .map_err(|err| validation::internal("serialize tool response failed", err))
}

pub(crate) fn json_success<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(to_json(value)?)]))
}
