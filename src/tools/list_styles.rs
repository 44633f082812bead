use rmcp::{ErrorData as McpError, model::CallToolResult};

use crate::styles::style_catalog;
use crate::tools::json_success;

pub async fn list_styles() -> Result<CallToolResult, McpError> {
    json_success(&style_catalog())
}
