use axum::extract::State;
use axum::Json;
use rand::Rng;
use serde::Serialize;

use crate::app::AppState;
use crate::error::AppError;
use crate::inference::client::{ChatMessage, ChatRequest, InferenceClient};

pub const FALLBACK_QUOTES: [&str; 10] = [
    "The only way to do great work is to love what you do.",
    "Success is not final, failure is not fatal: it is the courage to continue that counts.",
    "Believe you can and you're halfway there.",
    "The future belongs to those who believe in the beauty of their dreams.",
    "Don't watch the clock; do what it does. Keep going.",
    "The only limit to our realization of tomorrow is our doubts of today.",
    "It always seems impossible until it's done.",
    "Your time is limited, don't waste it living someone else's life.",
    "The way to get started is to quit talking and begin doing.",
    "What you get by achieving your goals is not as important as what you become by achieving your goals.",
];

const SYSTEM_PROMPT: &str = "You are a motivational quote generator. Create short, powerful, and creative \
motivational quotes that inspire people to take action, be positive, and achieve their goals. \
Keep quotes under 100 characters and make them impactful.";

const USER_PROMPT: &str =
    "Generate a new motivational quote that is short, powerful, and creative. Make it inspiring and actionable.";

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub quote: String,
    pub success: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

pub fn random_fallback_quote() -> &'static str {
    FALLBACK_QUOTES[rand::rng().random_range(0..FALLBACK_QUOTES.len())]
}

async fn generate(inference: &dyn InferenceClient, model: &str) -> Result<String, AppError> {
    inference
        .complete_chat(ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(USER_PROMPT)],
            max_tokens: 100,
            temperature: 0.8,
        })
        .await
}

/// A fresh quote, or one of the fixed quotes when generation fails.
pub async fn motivational_quote(inference: &dyn InferenceClient, model: &str) -> QuoteResponse {
    match generate(inference, model).await {
        Ok(quote) => QuoteResponse {
            quote,
            success: true,
            fallback: false,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Quote generation failed, using fallback");
            QuoteResponse {
                quote: random_fallback_quote().to_string(),
                success: false,
                fallback: true,
            }
        }
    }
}

/// Axum handler for `GET /api/quote`.
pub async fn quote_handler(State(state): State<AppState>) -> Json<QuoteResponse> {
    Json(motivational_quote(state.inference.as_ref(), &state.models.chat).await)
}
