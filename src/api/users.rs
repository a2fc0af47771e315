use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::WithRejection;
use mongodb::bson::doc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::models::AuthenticatedUser;
use crate::db::models::User;
use crate::error::AppError;
use crate::identity::sync::ensure_user_exists;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Axum handler for `GET /api/users`: the caller's documents in `users`.
pub async fn list_users_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, AppError> {
    let docs = state
        .scoped()
        .get_owned_documents(user.owner(), User::COLLECTION)
        .await?;
    let data = serde_json::to_value(&docs).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// Axum handler for `POST /api/users`.
pub async fn create_user_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Json(request), _): WithRejection<Json<CreateUserRequest>, AppError>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let name = request.name.trim();
    let email = request.email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(AppError::BadRequest("Name and email are required".into()));
    }

    let id = state
        .scoped()
        .add_with_owner(user.owner(), User::COLLECTION, doc! { "name": name, "email": email })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": { "id": id, "name": name, "email": email },
        })),
    ))
}

/// Axum handler for `POST /api/sync-user`.
///
/// Looks the caller up at the identity provider and makes sure a local user
/// record exists for them.
pub async fn sync_user_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, AppError> {
    let external = state.identity_provider.fetch_user(&user.user_id).await?;
    let local = ensure_user_exists(state.document_store.as_ref(), &external).await?;

    tracing::info!(external_id = %user.user_id, id = %local.id, "User synced");
    Ok(Json(json!({
        "success": true,
        "message": "User synced successfully",
        "user": local,
    })))
}
