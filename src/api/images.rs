use axum::extract::State;
use axum::Json;
use axum_extra::extract::WithRejection;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::library::library_file_url;
use crate::app::AppState;
use crate::auth::models::AuthenticatedUser;
use crate::db::models::{LibraryItem, LibraryItemInput, LibraryItemType, Record};
use crate::error::AppError;
use crate::inference::client::ImageRequest;
use crate::storage::scoped::library_path;

const TITLE_PREFIX_CHARS: usize = 50;

#[derive(Debug, Deserialize)]
pub struct GenerateImageRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateImageResponse {
    pub success: bool,
    pub image_url: String,
    pub prompt: String,
    pub item_id: String,
    pub library_item: LibraryItem,
}

/// Library title for a generated image: the prompt cut to 50 characters.
pub fn image_title(prompt: &str) -> String {
    let head: String = prompt.chars().take(TITLE_PREFIX_CHARS).collect();
    if prompt.chars().count() > TITLE_PREFIX_CHARS {
        format!("AI Generated Image: {}...", head)
    } else {
        format!("AI Generated Image: {}", head)
    }
}

fn library_input(prompt: &str, file_name: &str) -> LibraryItemInput {
    LibraryItemInput {
        title: image_title(prompt),
        description: format!("Generated using AI with prompt: \"{}\"", prompt),
        item_type: LibraryItemType::Other,
        url: None,
        file_url: Some(library_file_url(file_name)),
        file_name: Some(file_name.to_string()),
        author: Some("AI (DALL-E 3)".into()),
        tags: vec!["ai-generated".into(), "image".into(), "dall-e".into()],
    }
}

/// Generate an image, store it in the caller's library and record it.
pub async fn generate_library_image(
    state: &AppState,
    user: &AuthenticatedUser,
    prompt: &str,
) -> Result<GenerateImageResponse, AppError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::BadRequest("Prompt is required".into()));
    }

    let remote_url = state
        .inference
        .generate_image(ImageRequest {
            model: state.models.image.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: "1024x1024".into(),
            quality: "standard".into(),
            style: "vivid".into(),
        })
        .await?;
    let bytes = state.inference.download(&remote_url).await?;

    let file_name = format!("ai-generated-{}.png", Utc::now().timestamp_millis());
    state
        .files()
        .upload_user_file(user.owner(), &library_path(&file_name), bytes, "image/png")
        .await?;

    let scoped = state.scoped();
    let fields = LibraryItem::into_fields(library_input(prompt, &file_name))?;
    let item_id = scoped
        .add_with_owner(user.owner(), LibraryItem::COLLECTION, fields)
        .await?;
    let library_item = LibraryItem::from_document(
        scoped
            .get_owned_by_id(user.owner(), LibraryItem::COLLECTION, &item_id)
            .await?,
    )?;

    tracing::info!(item_id = %item_id, file_name = %file_name, "Generated image stored in library");

    Ok(GenerateImageResponse {
        success: true,
        image_url: library_file_url(&file_name),
        prompt: prompt.to_string(),
        item_id,
        library_item,
    })
}

/// Axum handler for `POST /api/generate-image`.
pub async fn generate_image_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Json(request), _): WithRejection<Json<GenerateImageRequest>, AppError>,
) -> Result<Json<GenerateImageResponse>, AppError> {
    Ok(Json(generate_library_image(&state, &user, &request.prompt).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_title_truncates_long_prompts() {
        assert_eq!(image_title("a red fox"), "AI Generated Image: a red fox");

        let long = "x".repeat(60);
        let title = image_title(&long);
        assert_eq!(title, format!("AI Generated Image: {}...", "x".repeat(50)));
    }

    #[test]
    fn test_image_title_counts_characters() {
        let prompt = "é".repeat(51);
        let title = image_title(&prompt);
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().filter(|c| *c == 'é').count(), 50);
    }

    #[test]
    fn test_library_input() {
        let input = library_input("a red fox", "ai-generated-1.png");
        assert_eq!(input.item_type, LibraryItemType::Other);
        assert_eq!(input.description, "Generated using AI with prompt: \"a red fox\"");
        assert_eq!(input.author.as_deref(), Some("AI (DALL-E 3)"));
        assert_eq!(input.tags, vec!["ai-generated", "image", "dall-e"]);
        assert_eq!(input.file_url.as_deref(), Some("/api/library/files/ai-generated-1.png"));
    }
}
