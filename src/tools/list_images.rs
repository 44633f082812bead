use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::JsonSchema,
};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::records::ImageRecord;
use crate::tools::{json_success, validation::{internal, require_user_id}};

const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListImagesRequest {
    #[schemars(description = "ID of the signed-in user")]
    pub user_id: String,
    #[schemars(description = "Maximum number of images to return, newest first. Default 20")]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ListedImage {
    #[serde(flatten)]
    record: ImageRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    tattoo_url: Option<String>,
}

pub async fn list_images(
    state: &AppState,
    Parameters(request): Parameters<ListImagesRequest>,
) -> Result<CallToolResult, McpError> {
    let user_id = require_user_id(&request.user_id)?;
    let limit = request.limit.unwrap_or(DEFAULT_LIMIT);
    let records = state
        .pipeline
        .images()
        .list_images(user_id)
        .await
        .map_err(|err| internal("list images failed", format!("{err:#}")))?;

    let listed: Vec<ListedImage> = records
        .into_iter()
        .take(limit)
        .map(|record| ListedImage {
            tattoo_url: record.tattoo_ref.as_deref().and_then(|r| state.public_url(r)),
            record,
        })
        .collect();
    json_success(&listed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::TattooUpdate;
    use crate::test_support::{idle_state, tool_json};

    #[tokio::test]
    async fn lists_newest_first_up_to_limit() {
        let (_dir, state) = idle_state();
        let png = crate::image_processing::sample_png(2, 2);
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(state.pipeline.submit_bytes("alice", &png).await.unwrap().id);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        state.pipeline.submit_bytes("bob", &png).await.unwrap();

        let request = ListImagesRequest {
            user_id: "alice".to_string(),
            limit: Some(2),
        };
        let body = tool_json(&list_images(&state, Parameters(request)).await.unwrap());
        let listed: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["id"].as_str().unwrap())
            .collect();
        assert_eq!(listed, vec![ids[2].to_string(), ids[1].to_string()]);
    }

    #[tokio::test]
    async fn processed_rows_carry_tattoo_url() {
        let (_dir, state) = idle_state();
        let png = crate::image_processing::sample_png(2, 2);
        let record = state.pipeline.submit_bytes("alice", &png).await.unwrap();
        let tattoo = state.storage.resolve_path("tattoos/done.png");
        let update = TattooUpdate {
            tattoo_ref: tattoo.to_string_lossy().to_string(),
            style: "Realism".to_string(),
        };
        state
            .pipeline
            .images()
            .mark_processed(record.id, "alice", &update)
            .await
            .unwrap();

        let request = ListImagesRequest {
            user_id: "alice".to_string(),
            limit: None,
        };
        let body = tool_json(&list_images(&state, Parameters(request)).await.unwrap());
        let row = &body[0];
        assert_eq!(row["processed"], true);
        assert_eq!(row["style"], "Realism");
        assert_eq!(row["tattoo_url"], "http://localhost/files/tattoos/done.png");
    }
}
