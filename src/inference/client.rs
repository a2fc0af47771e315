use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One message of a chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: MessageContent::Text(text.into()),
        }
    }

    /// A user message made of text followed by an image reference.
    pub fn user_with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: image_url.into() },
                },
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

/// A chat-completion request in the OpenAI wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Parameters of a single image generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub n: u32,
    pub size: String,
    pub quality: String,
    pub style: String,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Generative inference API (chat completion and image generation).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Run a chat completion and return the trimmed text of the first choice.
    async fn complete_chat(&self, request: ChatRequest) -> Result<String, AppError>;

    /// Generate one image and return its (temporary) URL.
    async fn generate_image(&self, request: ImageRequest) -> Result<String, AppError>;

    /// Download the bytes behind a URL returned by `generate_image`.
    async fn download(&self, url: &str) -> Result<Vec<u8>, AppError>;
}

/// InferenceClient for the OpenAI REST API (or any compatible endpoint).
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    fn api_key(&self) -> Result<&str, AppError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::Upstream("OpenAI API key is not configured".into()))
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<reqwest::Response, AppError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(self.api_key()?)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("OpenAI request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ApiErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| format!("OpenAI API error: {}", status.as_u16()));
            return Err(AppError::Upstream(message));
        }

        Ok(response)
    }
}

/// First non-empty choice text of a chat response.
fn first_choice(response: ChatResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[async_trait]
impl InferenceClient for OpenAiClient {
    async fn complete_chat(&self, request: ChatRequest) -> Result<String, AppError> {
        let response: ChatResponse = self
            .post("/chat/completions", &request)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid chat response: {e}")))?;

        first_choice(response).ok_or_else(|| AppError::Upstream("No content generated".into()))
    }

    async fn generate_image(&self, request: ImageRequest) -> Result<String, AppError> {
        let response: ImageResponse = self
            .post("/images/generations", &request)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid image response: {e}")))?;

        response
            .data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .ok_or_else(|| AppError::Upstream("No image URL returned from OpenAI".into()))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AppError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Upstream(format!("Failed to download generated image: {e}")))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to download generated image: {e}")))?;

        Ok(bytes.to_vec())
    }
}
