use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use mongodb::bson::doc;
use serde::Deserialize;
use sha2::Sha256;

use crate::db::models::{format_timestamp, User, OWNER_FIELD};
use crate::db::repository::{DocumentStore, Query, ID_FIELD};
use crate::error::AppError;
use crate::identity::provider::ExternalUser;
use crate::identity::sync::{profile_fields, provider_timestamp};

type HmacSha256 = Hmac<Sha256>;

/// Accepted distance between the signed timestamp and now, in seconds.
const TOLERANCE_SECS: u64 = 5 * 60;

/// The three delivery headers of a signed webhook.
#[derive(Debug, Clone)]
pub struct WebhookHeaders {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
}

impl WebhookHeaders {
    /// `None` unless all of `svix-id`, `svix-timestamp` and `svix-signature` are present.
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Option<Self> {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .filter(|v| !v.is_empty())
        };
        Some(Self {
            id: get("svix-id")?,
            timestamp: get("svix-timestamp")?,
            signature: get("svix-signature")?,
        })
    }
}

/// Verifies webhook deliveries signed with HMAC-SHA256 over
/// `{id}.{timestamp}.{body}`.
pub struct WebhookVerifier {
    key: Vec<u8>,
}

impl WebhookVerifier {
    /// `secret` is the base64 signing secret, optionally prefixed with `whsec_`.
    pub fn new(secret: &str) -> Result<Self, AppError> {
        let encoded = secret.strip_prefix("whsec_").unwrap_or(secret);
        let key = STANDARD
            .decode(encoded)
            .map_err(|e| AppError::Internal(format!("Invalid webhook secret: {e}")))?;
        if key.is_empty() {
            return Err(AppError::Internal("Webhook secret is empty".into()));
        }
        Ok(Self { key })
    }

    fn mac(&self, id: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256, AppError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AppError::Internal(format!("Invalid webhook key: {e}")))?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac)
    }

    /// Signature header value (`v1,<base64>`) for a delivery.
    pub fn sign(&self, id: &str, timestamp: &str, body: &[u8]) -> Result<String, AppError> {
        let digest = self.mac(id, timestamp, body)?.finalize().into_bytes();
        Ok(format!("v1,{}", STANDARD.encode(digest)))
    }

    pub fn verify(&self, headers: &WebhookHeaders, body: &[u8]) -> Result<(), AppError> {
        self.verify_at(headers, body, Utc::now().timestamp())
    }

    /// Verify against an explicit clock (Unix seconds).
    pub fn verify_at(&self, headers: &WebhookHeaders, body: &[u8], now: i64) -> Result<(), AppError> {
        let timestamp: i64 = headers
            .timestamp
            .trim()
            .parse()
            .map_err(|_| AppError::BadRequest("Invalid webhook timestamp".into()))?;

        if now.abs_diff(timestamp) > TOLERANCE_SECS {
            return Err(AppError::BadRequest("Webhook timestamp outside tolerance".into()));
        }

        let expected = self.mac(&headers.id, &headers.timestamp, body)?;
        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.strip_prefix("v1,"))
            .filter_map(|sig| STANDARD.decode(sig).ok())
            .any(|sig| expected.clone().verify_slice(&sig).is_ok());

        if matched {
            Ok(())
        } else {
            Err(AppError::BadRequest("Invalid webhook signature".into()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: serde_json::Value,
}

/// What a delivery did to the local user records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Created(String),
    Updated(String),
    Deactivated(String),
    /// Update or delete for a user without a local record.
    UnknownUser,
    Ignored(String),
}

fn parse_user(data: serde_json::Value) -> Result<ExternalUser, AppError> {
    serde_json::from_value(data).map_err(|e| AppError::BadRequest(format!("Invalid user payload: {e}")))
}

async fn find_local_id(store: &dyn DocumentStore, external_id: &str) -> Result<Option<String>, AppError> {
    let found = store
        .query(User::COLLECTION, Query::new().eq(OWNER_FIELD, external_id).limit(1))
        .await?;
    Ok(found
        .into_iter()
        .next()
        .and_then(|doc| doc.get_str(ID_FIELD).ok().map(str::to_string)))
}

/// Apply a verified webhook body to the user records.
pub async fn handle_event(store: &dyn DocumentStore, body: &[u8]) -> Result<WebhookOutcome, AppError> {
    let event: RawEvent =
        serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid webhook body: {e}")))?;
    let now = Utc::now();

    tracing::info!(event_type = %event.event_type, "Received identity webhook");

    match event.event_type.as_str() {
        "user.created" => {
            let user = parse_user(event.data)?;
            let mut fields = profile_fields(&user);
            fields.insert(OWNER_FIELD, user.id.clone());
            fields.insert("created_at", provider_timestamp(user.created_at, now));
            fields.insert("updated_at", format_timestamp(now));
            fields.insert("is_active", true);

            let id = store.add(User::COLLECTION, fields).await?;
            tracing::info!(external_id = %user.id, id = %id, "Created user record");
            Ok(WebhookOutcome::Created(id))
        }
        "user.updated" => {
            let user = parse_user(event.data)?;
            let Some(id) = find_local_id(store, &user.id).await? else {
                return Ok(WebhookOutcome::UnknownUser);
            };

            let mut fields = profile_fields(&user);
            fields.insert("updated_at", provider_timestamp(user.updated_at, now));
            store.update(User::COLLECTION, &id, fields).await?;
            tracing::info!(external_id = %user.id, id = %id, "Updated user record");
            Ok(WebhookOutcome::Updated(id))
        }
        "user.deleted" => {
            let user = parse_user(event.data)?;
            let Some(id) = find_local_id(store, &user.id).await? else {
                return Ok(WebhookOutcome::UnknownUser);
            };

            store
                .update(
                    User::COLLECTION,
                    &id,
                    doc! { "is_active": false, "updated_at": format_timestamp(now) },
                )
                .await?;
            tracing::info!(external_id = %user.id, id = %id, "Deactivated user record");
            Ok(WebhookOutcome::Deactivated(id))
        }
        other => Ok(WebhookOutcome::Ignored(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryDocumentStore;

    // base64("test-webhook-secret")
    const SECRET: &str = "whsec_dGVzdC13ZWJob29rLXNlY3JldA==";

    fn signed(verifier: &WebhookVerifier, body: &[u8], timestamp: i64) -> WebhookHeaders {
        let ts = timestamp.to_string();
        WebhookHeaders {
            id: "msg_1".into(),
            signature: verifier.sign("msg_1", &ts, body).unwrap(),
            timestamp: ts,
        }
    }

    #[test]
    fn test_valid_signature() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let body = br#"{"type":"user.created"}"#;
        let headers = signed(&verifier, body, 1_700_000_000);
        verifier.verify_at(&headers, body, 1_700_000_030).unwrap();
    }

    #[test]
    fn test_tampered_body_is_rejected() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let headers = signed(&verifier, b"original", 1_700_000_000);
        assert!(matches!(
            verifier.verify_at(&headers, b"tampered", 1_700_000_000),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let signer = WebhookVerifier::new("whsec_b3RoZXItc2VjcmV0").unwrap();
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let headers = signed(&signer, b"body", 1_700_000_000);
        assert!(verifier.verify_at(&headers, b"body", 1_700_000_000).is_err());
    }

    #[test]
    fn test_stale_timestamp_is_rejected() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let headers = signed(&verifier, b"body", 1_700_000_000);
        assert!(verifier.verify_at(&headers, b"body", 1_700_000_000 + 301).is_err());
        assert!(verifier.verify_at(&headers, b"body", 1_700_000_000 - 301).is_err());
    }

    #[test]
    fn test_extreme_timestamps_are_rejected() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        for ts in [i64::MIN, i64::MAX] {
            let headers = signed(&verifier, b"body", ts);
            assert!(matches!(
                verifier.verify_at(&headers, b"body", 1_700_000_000),
                Err(AppError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn test_any_listed_signature_may_match() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let mut headers = signed(&verifier, b"body", 1_700_000_000);
        headers.signature = format!("v1,bm90LWl0 {}", headers.signature);
        verifier.verify_at(&headers, b"body", 1_700_000_000).unwrap();
    }

    #[test]
    fn test_invalid_secret() {
        assert!(WebhookVerifier::new("whsec_***").is_err());
        assert!(WebhookVerifier::new("").is_err());
    }

    #[test]
    fn test_headers_require_all_three() {
        let mut map = axum::http::HeaderMap::new();
        map.insert("svix-id", "msg_1".parse().unwrap());
        map.insert("svix-timestamp", "1700000000".parse().unwrap());
        assert!(WebhookHeaders::from_headers(&map).is_none());

        map.insert("svix-signature", "v1,abc".parse().unwrap());
        assert!(WebhookHeaders::from_headers(&map).is_some());
    }

    #[tokio::test]
    async fn test_user_lifecycle_events() {
        let store = MemoryDocumentStore::new();

        let created = br#"{"type": "user.created", "data": {
            "id": "user_ada",
            "email_addresses": [{"email_address": "ada@example.com"}],
            "first_name": "Ada", "last_name": "Lovelace",
            "created_at": 1704067200000
        }}"#;
        let WebhookOutcome::Created(id) = handle_event(&store, created).await.unwrap() else {
            panic!("Expected Created");
        };

        let user = User::from_document(store.get_by_id(User::COLLECTION, &id).await.unwrap().unwrap()).unwrap();
        assert_eq!(user.external_id, "user_ada");
        assert_eq!(user.email, "ada@example.com");
        assert!(user.is_active);

        let updated = br#"{"type": "user.updated", "data": {
            "id": "user_ada",
            "email_addresses": [{"email_address": "countess@example.com"}],
            "first_name": "Augusta", "last_name": "King",
            "updated_at": 1704153600000
        }}"#;
        assert_eq!(
            handle_event(&store, updated).await.unwrap(),
            WebhookOutcome::Updated(id.clone())
        );
        let user = User::from_document(store.get_by_id(User::COLLECTION, &id).await.unwrap().unwrap()).unwrap();
        assert_eq!(user.email, "countess@example.com");
        assert_eq!(user.first_name, "Augusta");

        let deleted = br#"{"type": "user.deleted", "data": {"id": "user_ada", "deleted": true}}"#;
        assert_eq!(
            handle_event(&store, deleted).await.unwrap(),
            WebhookOutcome::Deactivated(id.clone())
        );
        let user = User::from_document(store.get_by_id(User::COLLECTION, &id).await.unwrap().unwrap()).unwrap();
        assert!(!user.is_active);
    }

    #[tokio::test]
    async fn test_update_for_unknown_user_is_a_no_op() {
        let store = MemoryDocumentStore::new();
        let body = br#"{"type": "user.updated", "data": {"id": "user_ghost"}}"#;
        assert_eq!(handle_event(&store, body).await.unwrap(), WebhookOutcome::UnknownUser);
        assert!(store.get_all(User::COLLECTION).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_events_are_ignored() {
        let store = MemoryDocumentStore::new();
        let body = br#"{"type": "session.created", "data": {"id": "sess_1"}}"#;
        assert_eq!(
            handle_event(&store, body).await.unwrap(),
            WebhookOutcome::Ignored("session.created".into())
        );
    }
}
