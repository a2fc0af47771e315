use axum::extract::{Multipart, Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::models::AuthenticatedUser;
use crate::db::models::{LibraryItem, Record};
use crate::db::scoped::ScopedStore;
use crate::error::AppError;
use crate::storage::scoped::{library_path, sanitize_file_name, UserFiles};

/// Response from a successful library file upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub file_name: String,
    /// Path the file is served from.
    pub file_url: String,
}

pub fn library_file_url(file_name: &str) -> String {
    format!("/api/library/files/{}", file_name)
}

/// Content type inferred from the file extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",
        "json" => "application/json",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

/// Delete a library item and, when it has one, its backing file.
pub async fn delete_library_item(
    scoped: &ScopedStore,
    files: &UserFiles,
    owner: &str,
    id: &str,
) -> Result<(), AppError> {
    let item = LibraryItem::from_document(
        scoped
            .get_owned_by_id(owner, LibraryItem::COLLECTION, id)
            .await?,
    )?;

    scoped.delete_with_owner(owner, LibraryItem::COLLECTION, id).await?;

    if let Some(file_name) = &item.file_name {
        files.delete_user_file(owner, &library_path(file_name)).await?;
    }
    Ok(())
}

/// Axum handler for `DELETE /api/library/{id}`.
pub async fn delete_library_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    delete_library_item(&state.scoped(), &state.files(), user.owner(), &id).await?;
    tracing::info!(id = %id, "Library item deleted");
    Ok(Json(json!({ "success": true, "id": id })))
}

/// Axum handler for `POST /api/library/files`.
///
/// Accepts a multipart form with a single file field named "file" and
/// stores it under the caller's library folder.
pub async fn upload_file_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = sanitize_file_name(field.file_name().unwrap_or("upload.bin"));
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| content_type_for(&file_name).to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file: {e}")))?;

        state
            .files()
            .upload_user_file(user.owner(), &library_path(&file_name), data.to_vec(), &content_type)
            .await?;

        tracing::info!(file_name = %file_name, size = data.len(), "Library file uploaded");
        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                success: true,
                file_url: library_file_url(&file_name),
                file_name,
            }),
        ));
    }

    Err(AppError::BadRequest("No file field found in request".into()))
}

/// Axum handler for `GET /api/library/files/{file_name}`.
pub async fn serve_file_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(file_name): Path<String>,
) -> Result<Response, AppError> {
    let file_name = sanitize_file_name(&file_name);
    let data = state
        .files()
        .get_user_file(user.owner(), &library_path(&file_name))
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;

    Ok(([(CONTENT_TYPE, content_type_for(&file_name))], data).into_response())
}
