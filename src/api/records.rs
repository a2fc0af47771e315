use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::models::AuthenticatedUser;
use crate::db::models::Record;
use crate::error::AppError;

/// Owned records of kind `T`, oldest first.
pub async fn list_records<T: Record>(state: &AppState, user: &AuthenticatedUser) -> Result<Vec<T>, AppError> {
    state
        .scoped()
        .get_owned_documents(user.owner(), T::COLLECTION)
        .await?
        .into_iter()
        .map(T::from_document)
        .collect()
}

/// Validate and insert a new record, returning it as stored.
pub async fn create_record<T: Record>(
    state: &AppState,
    user: &AuthenticatedUser,
    input: T::Input,
) -> Result<T, AppError> {
    let fields = T::into_fields(input)?;
    let scoped = state.scoped();
    let id = scoped.add_with_owner(user.owner(), T::COLLECTION, fields).await?;
    T::from_document(scoped.get_owned_by_id(user.owner(), T::COLLECTION, &id).await?)
}

pub async fn list_handler<T: Record>(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, AppError> {
    let records = list_records::<T>(&state, &user).await?;
    Ok(Json(json!({ "success": true, "data": records })))
}

pub async fn create_handler<T: Record>(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Json(input), _): WithRejection<Json<T::Input>, AppError>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let record = create_record::<T>(&state, &user, input).await?;
    tracing::info!(collection = T::COLLECTION, id = %record.id(), "Record created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "id": record.id(), "data": record })),
    ))
}

pub async fn get_handler<T: Record>(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doc = state
        .scoped()
        .get_owned_by_id(user.owner(), T::COLLECTION, &id)
        .await?;
    Ok(Json(json!({ "success": true, "data": T::from_document(doc)? })))
}

pub async fn update_handler<T: Record>(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    WithRejection(Json(input), _): WithRejection<Json<T::Input>, AppError>,
) -> Result<Json<Value>, AppError> {
    let fields = T::into_fields(input)?;
    state
        .scoped()
        .update_with_owner(user.owner(), T::COLLECTION, &id, fields)
        .await?;
    Ok(Json(json!({ "success": true, "id": id })))
}

pub async fn delete_handler<T: Record>(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state
        .scoped()
        .delete_with_owner(user.owner(), T::COLLECTION, &id)
        .await?;
    tracing::info!(collection = T::COLLECTION, id = %id, "Record deleted");
    Ok(Json(json!({ "success": true, "id": id })))
}
