//! Upload and listing endpoints.

use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use std::sync::Arc;
use tracing::debug;

use super::{ApiError, AppState};
use crate::models::SearchResult;

/// Name of the multipart field carrying the image.
pub const UPLOAD_FIELD: &str = "file";

/// `POST /upload/`
///
/// Runs the image through detection and search, replaces the stored set and
/// returns it. An image with no recognizable product yields `[]`.
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::validation(e.body_text()))?;
    let (filename, bytes) = read_upload(&mut multipart).await?;

    debug!(filename = %filename, size = bytes.len(), "Received upload");

    let results = state.pipeline().handle_upload(&filename, bytes).await?;
    Ok(Json(results))
}

/// `GET /items/`
pub async fn list_items(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let results = state.pipeline().handle_list().await?;

    if results.is_empty() {
        return Err(ApiError::not_found("No results found"));
    }

    Ok(Json(results))
}

async fn read_upload(multipart: &mut Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(UPLOAD_FIELD) {
            return read_field(field).await;
        }
    }

    Err(ApiError::validation(format!(
        "Missing multipart field '{UPLOAD_FIELD}'"
    )))
}

async fn read_field(field: Field<'_>) -> Result<(String, Vec<u8>), ApiError> {
    let filename = field.file_name().unwrap_or_default().to_string();
    let bytes = field.bytes().await.map_err(multipart_error)?;
    Ok((filename, bytes.to_vec()))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Uploaded file is too large".to_string())
    } else {
        ApiError::validation(err.body_text())
    }
}
