use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::app::AppState;
use crate::auth::models::AuthenticatedUser;
use crate::db::models::{BusinessIdea, LibraryItem, Note, Record};
use crate::db::scoped::ScopedStore;
use crate::error::AppError;

/// Dashboard counters for one user.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Stats {
    pub success: bool,
    pub notes: usize,
    pub ideas: usize,
    pub library: usize,
    /// Library items backed by an uploaded or generated file.
    pub files: usize,
}

pub async fn user_stats(scoped: &ScopedStore, owner: &str) -> Result<Stats, AppError> {
    let notes = scoped.get_owned_documents(owner, Note::COLLECTION).await?.len();
    let ideas = scoped
        .get_owned_documents(owner, BusinessIdea::COLLECTION)
        .await?
        .len();
    let library = scoped.get_owned_documents(owner, LibraryItem::COLLECTION).await?;
    let files = library
        .iter()
        .filter(|doc| doc.get_str("file_name").is_ok_and(|name| !name.is_empty()))
        .count();

    Ok(Stats {
        success: true,
        notes,
        ideas,
        library: library.len(),
        files,
    })
}

/// Axum handler for `GET /api/stats`.
pub async fn stats_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Stats>, AppError> {
    Ok(Json(user_stats(&state.scoped(), user.owner()).await?))
}
