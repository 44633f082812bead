use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::app::AppState;
use crate::image_processing::inspect_image;

const UPLOAD_HTML: &str = include_str!("../templates/upload.html");

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct UploadResponse {
    image_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorResponse { error: message.to_string() })).into_response()
}

pub async fn upload_page() -> Html<&'static str> {
    Html(UPLOAD_HTML)
}

/// Multipart form with a `user_id` text field and a `file` image field.
pub async fn handle_image_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Response {
    let mut user_id = None;
    let mut bytes = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => match field.name().map(str::to_string).as_deref() {
                Some("user_id") => match field.text().await {
                    Ok(value) => user_id = Some(value.trim().to_string()),
                    Err(err) => {
                        let message = format!("failed to read user_id: {err}");
                        return json_error(StatusCode::BAD_REQUEST, &message);
                    }
                },
                Some("file") => {
                    if let Some(content_type) = field.content_type() {
                        if !content_type.starts_with("image/") {
                            let message = "only image uploads are accepted";
                            return json_error(StatusCode::BAD_REQUEST, message);
                        }
                    }
                    match field.bytes().await {
                        Ok(data) => bytes = Some(data),
                        Err(err) => {
                            let message = format!("failed to read file: {err}");
                            return json_error(StatusCode::BAD_REQUEST, &message);
                        }
                    }
                }
                _ => {}
            },
            Ok(None) => break,
            Err(err) => {
                return json_error(StatusCode::BAD_REQUEST, &format!("failed to read form: {err}"));
            }
        }
    }

    let user_id = match user_id.filter(|value| !value.is_empty()) {
        Some(value) => value,
        None => return json_error(StatusCode::BAD_REQUEST, "user_id is required"),
    };
    let bytes = match bytes {
        Some(data) if !data.is_empty() => data,
        _ => return json_error(StatusCode::BAD_REQUEST, "no file was uploaded"),
    };
    if let Err(err) = inspect_image(&bytes) {
        let message = format!("file is not a supported image: {err}");
        return json_error(StatusCode::BAD_REQUEST, &message);
    }

    match state.pipeline.submit_bytes(&user_id, &bytes).await {
        Ok(record) => {
            let url = state.public_url(&record.original_ref);
            (StatusCode::OK, Json(UploadResponse { image_id: record.id, url })).into_response()
        }
        Err(err) => {
            warn!(%user_id, error = %err, "upload could not be stored");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, &format!("failed to save upload: {err}"))
        }
    }
}
