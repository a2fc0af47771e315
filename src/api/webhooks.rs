use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use crate::app::AppState;
use crate::error::AppError;
use crate::identity::webhook::{handle_event, WebhookHeaders};

/// Axum handler for `POST /api/webhooks/clerk`.
///
/// The body is taken raw: the signature covers the exact bytes sent.
pub async fn clerk_webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let headers = WebhookHeaders::from_headers(&headers)
        .ok_or_else(|| AppError::BadRequest("Missing webhook signature headers".into()))?;

    let verifier = state
        .webhook_verifier
        .as_ref()
        .ok_or_else(|| AppError::Internal("Webhook secret is not configured".into()))?;

    if let Err(e) = verifier.verify(&headers, &body) {
        tracing::warn!(error = %e, webhook_id = %headers.id, "Rejected webhook delivery");
        return Err(e);
    }

    let outcome = handle_event(state.document_store.as_ref(), &body).await?;
    tracing::debug!(?outcome, "Webhook processed");
    Ok(StatusCode::OK)
}
