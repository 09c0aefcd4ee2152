use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ledgerfold_core::imports::{DeleteBatchResult, ImportBatch, ImportResult, StatementPreview};

const DEFAULT_FILENAME: &str = "statement.csv";

/// An uploaded statement: original filename and raw bytes.
struct Upload {
    filename: String,
    content: Vec<u8>,
}

async fn read_upload(mut multipart: Multipart) -> ApiResult<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
        let content = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file content: {}", e)))?
            .to_vec();
        return Ok(Upload { filename, content });
    }
    Err(ApiError::BadRequest(
        "Missing file in multipart request".to_string(),
    ))
}

async fn import_statement(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ImportResult>)> {
    let upload = read_upload(multipart).await?;
    tracing::debug!("Received {} ({} bytes)", upload.filename, upload.content.len());
    let result = state
        .import_service
        .import_statement(&upload.filename, &upload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn preview_statement(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<Json<StatementPreview>> {
    let upload = read_upload(multipart).await?;
    let preview = state
        .import_service
        .preview_statement(&upload.filename, &upload.content)?;
    Ok(Json(preview))
}

async fn list_batches(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<ImportBatch>>> {
    Ok(Json(state.import_service.list_batches()?))
}

async fn get_batch(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ImportBatch>> {
    Ok(Json(state.import_service.get_batch(&id)?))
}

async fn delete_batch(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DeleteBatchResult>> {
    Ok(Json(state.import_service.delete_batch(&id).await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/imports", get(list_batches).post(import_statement))
        .route("/imports/preview", post(preview_statement))
        .route("/imports/{id}", get(get_batch).delete(delete_batch))
}
