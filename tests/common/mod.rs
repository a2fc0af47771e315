#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};

use notebench::app::{router, AppState, Models};
use notebench::auth::session::{SessionClaims, SessionVerifier};
use notebench::db::memory::MemoryDocumentStore;
use notebench::db::repository::DocumentStore;
use notebench::error::AppError;
use notebench::identity::provider::{EmailAddress, ExternalUser, IdentityProvider};
use notebench::identity::webhook::WebhookVerifier;
use notebench::inference::client::{ChatRequest, ImageRequest, InferenceClient};
use notebench::storage::client::StorageClient;
use notebench::storage::memory::MemoryStorageClient;
use notebench::video::client::{SearchOrder, VideoClient, VideoDetails, VideoSummary};

pub const SESSION_SECRET: &[u8] = b"test-session-secret";
/// base64("test-webhook-secret")
pub const WEBHOOK_SECRET: &str = "whsec_dGVzdC13ZWJob29rLXNlY3JldA==";
pub const FAKE_IMAGE_URL: &str = "https://images.example/generated.png";
pub const FAKE_PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Session token for `user_id`, signed with the test secret.
pub fn token(user_id: &str) -> String {
    let claims = SessionClaims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
        email: Some(format!("{user_id}@example.com")),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SESSION_SECRET))
        .expect("Failed to sign test token")
}

/// Inference fake: either answers everything or fails everything.
pub struct FakeInference {
    pub reply: Option<String>,
    pub chat_requests: Mutex<Vec<ChatRequest>>,
}

impl FakeInference {
    pub fn answering(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            chat_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            chat_requests: Mutex::new(Vec::new()),
        }
    }

    fn down() -> AppError {
        AppError::Upstream("OpenAI API error: 503".into())
    }
}

#[async_trait]
impl InferenceClient for FakeInference {
    async fn complete_chat(&self, request: ChatRequest) -> Result<String, AppError> {
        self.chat_requests.lock().unwrap().push(request);
        self.reply.clone().ok_or_else(Self::down)
    }

    async fn generate_image(&self, _request: ImageRequest) -> Result<String, AppError> {
        self.reply.as_ref().map(|_| FAKE_IMAGE_URL.to_string()).ok_or_else(Self::down)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AppError> {
        assert_eq!(url, FAKE_IMAGE_URL);
        Ok(FAKE_PNG.to_vec())
    }
}

/// Video fake for an unreachable platform.
pub struct UnreachableVideos;

#[async_trait]
impl VideoClient for UnreachableVideos {
    async fn trending(&self) -> Result<Vec<VideoSummary>, AppError> {
        Err(AppError::Upstream("quota exceeded".into()))
    }

    async fn search(&self, _query: &str, _order: SearchOrder) -> Result<Vec<VideoSummary>, AppError> {
        Err(AppError::Upstream("quota exceeded".into()))
    }

    async fn details(&self, _video_id: &str) -> Result<Option<VideoDetails>, AppError> {
        Err(AppError::Upstream("quota exceeded".into()))
    }
}

/// Identity provider fake that knows every user as `<id>@example.com`.
pub struct FakeIdentity;

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn fetch_user(&self, user_id: &str) -> Result<ExternalUser, AppError> {
        Ok(ExternalUser {
            id: user_id.to_string(),
            email_addresses: vec![EmailAddress {
                email_address: format!("{user_id}@example.com"),
            }],
            first_name: Some("Test".into()),
            last_name: Some("User".into()),
            created_at: None,
            updated_at: None,
        })
    }
}

/// In-memory application wired with fakes for every outbound service.
pub struct TestEnv {
    pub router: Router,
    pub store: Arc<dyn DocumentStore>,
    pub storage: Arc<dyn StorageClient>,
    pub inference: Arc<FakeInference>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_inference(FakeInference::answering("Keep going."))
    }

    pub fn with_inference(inference: FakeInference) -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let storage: Arc<dyn StorageClient> = Arc::new(MemoryStorageClient::new());
        Self::with_backends(store, storage, inference)
    }

    pub fn with_backends(
        store: Arc<dyn DocumentStore>,
        storage: Arc<dyn StorageClient>,
        inference: FakeInference,
    ) -> Self {
        let inference = Arc::new(inference);
        let state = AppState {
            document_store: store.clone(),
            storage_client: storage.clone(),
            inference: inference.clone(),
            videos: Arc::new(UnreachableVideos),
            identity_provider: Arc::new(FakeIdentity),
            session_verifier: Arc::new(SessionVerifier::from_secret(SESSION_SECRET)),
            webhook_verifier: Some(Arc::new(
                WebhookVerifier::new(WEBHOOK_SECRET).expect("Invalid test webhook secret"),
            )),
            models: Models::default(),
        };

        Self {
            router: router(state),
            store,
            storage,
            inference,
        }
    }

    /// A `TestServer` that does not expect success by default.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .try_build(self.router.clone())
            .expect("Failed to build TestServer")
    }

    /// Sign a webhook delivery for `body` at the current time.
    pub fn webhook_headers(&self, body: &str) -> HashMap<&'static str, String> {
        let verifier = WebhookVerifier::new(WEBHOOK_SECRET).expect("Invalid test webhook secret");
        let timestamp = Utc::now().timestamp().to_string();
        let signature = verifier
            .sign("msg_test", &timestamp, body.as_bytes())
            .expect("Failed to sign webhook");

        HashMap::from([
            ("svix-id", "msg_test".to_string()),
            ("svix-timestamp", timestamp),
            ("svix-signature", signature),
        ])
    }
}
