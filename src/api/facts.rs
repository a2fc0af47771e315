use axum::extract::State;
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::AppError;
use crate::inference::client::{ChatMessage, ChatRequest, InferenceClient};

#[derive(Debug, Deserialize)]
pub struct FactsRequest {
    #[serde(default, alias = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactsLanguage {
    English,
    French,
    Arabic,
}

impl FactsLanguage {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "english" => Some(Self::English),
            "french" => Some(Self::French),
            "arabic" => Some(Self::Arabic),
            _ => None,
        }
    }

    /// Name used in prompts and responses.
    pub fn tag(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::French => "French",
            Self::Arabic => "Arabic",
        }
    }

    pub fn fallback_facts(self) -> [&'static str; 3] {
        match self {
            Self::English => [
                "1. This image contains elements that showcase the incredible diversity of our world.",
                "2. Every detail tells a story about the beauty and complexity of nature and human creativity.",
                "3. Images like this remind us of the wonder and mystery that surrounds us every day.",
            ],
            Self::French => [
                "1. Cette image contient des éléments qui montrent l'incroyable diversité de notre monde.",
                "2. Chaque détail raconte une histoire sur la beauté et la complexité de la nature et de la créativité humaine.",
                "3. Des images comme celle-ci nous rappellent l'émerveillement et le mystère qui nous entourent chaque jour.",
            ],
            Self::Arabic => [
                "1. تحتوي هذه الصورة على عناصر تُظهر التنوع المذهل لعالمنا.",
                "2. كل تفصيل يحكي قصة عن جمال وتعقيد الطبيعة والإبداع البشري.",
                "3. صور مثل هذه تذكرنا بالعجب والغموض الذي يحيط بنا كل يوم.",
            ],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FactsResponse {
    pub success: bool,
    pub facts: String,
    pub language: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

fn system_prompt(language: &str) -> String {
    format!(
        "You are an expert image analyzer and fun facts generator. Analyze the provided image and \
generate 3 interesting, educational, and entertaining facts about what you see. The facts should be:

1. Accurate and informative
2. Engaging and surprising
3. Educational but fun
4. Appropriate for all ages
5. Focused on the main subjects in the image (animals, nature, people, objects, etc.)

Respond ONLY with the 3 facts, numbered 1-3, in {language}. Each fact should be 1-2 sentences long. \
Be specific about what you observe in the image.

If the image contains:
- Animals: Share facts about the species, behavior, habitat, or unique characteristics
- Nature/Landscapes: Share facts about geography, geology, weather, or natural phenomena
- People: Share facts about culture, history, activities, or human behavior
- Objects/Architecture: Share facts about design, history, technology, or cultural significance

Make the facts fascinating and make people want to learn more!"
    )
}

/// Validate a facts request into its image URL and language.
pub fn validate(request: FactsRequest) -> Result<(String, FactsLanguage), AppError> {
    let image_url = request
        .image_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| AppError::BadRequest("Image URL is required".into()))?;

    let language = request
        .language
        .as_deref()
        .and_then(FactsLanguage::parse)
        .ok_or_else(|| {
            AppError::BadRequest("Valid language is required (english, french, or arabic)".into())
        })?;

    Ok((image_url, language))
}

/// Three facts about the image, or the fixed sentences for the language.
pub async fn image_facts(
    inference: &dyn InferenceClient,
    model: &str,
    image_url: String,
    language: FactsLanguage,
) -> FactsResponse {
    let request = ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(system_prompt(language.tag())),
            ChatMessage::user_with_image(
                format!(
                    "Please analyze this image and generate 3 fun facts about what you see, written in {}.",
                    language.tag()
                ),
                image_url.clone(),
            ),
        ],
        max_tokens: 500,
        temperature: 0.7,
    };

    match inference.complete_chat(request).await {
        Ok(facts) => FactsResponse {
            success: true,
            facts,
            language: language.tag(),
            image_url: Some(image_url),
            fallback: false,
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, language = language.tag(), "Facts generation failed, using fallback");
            FactsResponse {
                success: false,
                facts: language.fallback_facts().join("\n"),
                language: language.tag(),
                image_url: None,
                fallback: true,
                error: Some("Using fallback facts due to API error"),
            }
        }
    }
}

/// Axum handler for `POST /api/generate-facts`.
pub async fn generate_facts_handler(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<FactsRequest>, AppError>,
) -> Result<Json<FactsResponse>, AppError> {
    let (image_url, language) = validate(request)?;
    Ok(Json(
        image_facts(state.inference.as_ref(), &state.models.vision, image_url, language).await,
    ))
}
