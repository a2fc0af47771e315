use chrono::{DateTime, SecondsFormat, Utc};
use mongodb::bson::Document;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::storage::scoped::sanitize_file_name;

/// Field holding the identity of the document's owner.
pub const OWNER_FIELD: &str = "owner_id";
pub const CREATED_AT_FIELD: &str = "created_at";
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Timestamps are stored as fixed-width RFC 3339 strings (millisecond
/// precision, `Z` suffix) so lexical order matches chronological order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Trim every tag and drop the empty ones.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn require_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required".into()));
    }
    Ok(title.to_string())
}

/// An owner-scoped entity stored in its own collection.
///
/// `Input` is the client payload for create and update; `into_fields`
/// validates it and produces the fields to write (without owner or
/// timestamps, which the access layer stamps).
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: &'static str;

    type Input: DeserializeOwned + Send + 'static;

    fn into_fields(input: Self::Input) -> Result<Document, AppError>;

    fn id(&self) -> &str;

    /// Decode a stored document.
    fn from_document(doc: Document) -> Result<Self, AppError> {
        Ok(mongodb::bson::from_document(doc)?)
    }
}

// -- Notes --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Record for Note {
    const COLLECTION: &'static str = "notes";
    type Input = NoteInput;

    fn id(&self) -> &str {
        &self.id
    }

    fn into_fields(input: NoteInput) -> Result<Document, AppError> {
        let input = NoteInput {
            title: require_title(&input.title)?,
            content: input.content.trim().to_string(),
            tags: normalize_tags(input.tags),
        };
        Ok(mongodb::bson::to_document(&input)?)
    }
}

// -- Business ideas --

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaStatus {
    #[default]
    Idea,
    Research,
    Planning,
    Development,
    Launched,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessIdea {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub revenue_model: String,
    #[serde(default)]
    pub status: IdeaStatus,
    #[serde(default)]
    pub priority: IdeaPriority,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessIdeaInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub revenue_model: String,
    #[serde(default)]
    pub status: IdeaStatus,
    #[serde(default)]
    pub priority: IdeaPriority,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Record for BusinessIdea {
    const COLLECTION: &'static str = "business_ideas";
    type Input = BusinessIdeaInput;

    fn id(&self) -> &str {
        &self.id
    }

    fn into_fields(input: BusinessIdeaInput) -> Result<Document, AppError> {
        let input = BusinessIdeaInput {
            title: require_title(&input.title)?,
            description: input.description.trim().to_string(),
            market: input.market.trim().to_string(),
            target_audience: input.target_audience.trim().to_string(),
            revenue_model: input.revenue_model.trim().to_string(),
            tags: normalize_tags(input.tags),
            ..input
        };
        Ok(mongodb::bson::to_document(&input)?)
    }
}

// -- Library --

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryItemType {
    #[default]
    Article,
    Book,
    Video,
    Document,
    Link,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryItem {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub item_type: LibraryItemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    /// Name of the backing blob under `users/{owner_id}/library/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryItemInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub item_type: LibraryItemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Record for LibraryItem {
    const COLLECTION: &'static str = "library";
    type Input = LibraryItemInput;

    fn id(&self) -> &str {
        &self.id
    }

    fn into_fields(input: LibraryItemInput) -> Result<Document, AppError> {
        let input = LibraryItemInput {
            title: require_title(&input.title)?,
            description: input.description.trim().to_string(),
            item_type: input.item_type,
            url: non_blank(input.url),
            file_url: non_blank(input.file_url),
            file_name: non_blank(input.file_name).map(|name| sanitize_file_name(&name)),
            author: non_blank(input.author),
            tags: normalize_tags(input.tags),
        };
        Ok(mongodb::bson::to_document(&input)?)
    }
}

// -- Users --

/// A local user record mirroring the identity provider's user.
///
/// The owner field of a user record is the user itself, so the external
/// identity is stored under `owner_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(rename = "owner_id")]
    pub external_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl User {
    pub const COLLECTION: &'static str = "users";

    pub fn from_document(doc: Document) -> Result<Self, AppError> {
        Ok(mongodb::bson::from_document(doc)?)
    }
}
