use rmcp::ErrorData as McpError;
use serde_json::Value;
use uuid::Uuid;

pub fn require_user_id(raw: &str) -> Result<&str, McpError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(McpError::invalid_params("user_id must not be empty", None));
    }
    Ok(trimmed)
}

pub fn parse_image_id(raw: &str) -> Result<Uuid, McpError> {
    Uuid::parse_str(raw.trim()).map_err(|err| {
        McpError::invalid_params(
            "image_id is not a valid uuid",
            Some(Value::String(err.to_string())),
        )
    })
}

pub fn internal(message: &'static str, err: impl std::fmt::Display) -> McpError {
    McpError::internal_error(message, Some(Value::String(err.to_string())))
}
