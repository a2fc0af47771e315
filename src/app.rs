use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::auth::session::SessionVerifier;
use crate::db::repository::DocumentStore;
use crate::db::scoped::ScopedStore;
use crate::identity::provider::IdentityProvider;
use crate::identity::webhook::WebhookVerifier;
use crate::inference::client::InferenceClient;
use crate::storage::client::StorageClient;
use crate::storage::scoped::UserFiles;
use crate::video::client::VideoClient;

/// Model names used by the generation endpoints.
#[derive(Debug, Clone)]
pub struct Models {
    pub chat: String,
    pub vision: String,
    pub image: String,
}

impl Default for Models {
    fn default() -> Self {
        Self {
            chat: "gpt-3.5-turbo".into(),
            vision: "gpt-4o".into(),
            image: "dall-e-3".into(),
        }
    }
}

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub document_store: Arc<dyn DocumentStore>,
    pub storage_client: Arc<dyn StorageClient>,
    pub inference: Arc<dyn InferenceClient>,
    pub videos: Arc<dyn VideoClient>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub session_verifier: Arc<SessionVerifier>,
    /// `None` when no signing secret is configured; deliveries are then refused.
    pub webhook_verifier: Option<Arc<WebhookVerifier>>,
    pub models: Models,
}

impl AppState {
    /// Owner-scoped view of the document store.
    pub fn scoped(&self) -> ScopedStore {
        ScopedStore::new(self.document_store.clone())
    }

    pub fn files(&self) -> UserFiles {
        UserFiles::new(self.storage_client.clone())
    }
}

pub fn router(state: AppState) -> Router {
    use crate::db::models::{BusinessIdea, LibraryItem, Note};

    Router::new()
        .route("/api/quote", get(api::quote::quote_handler))
        .route("/api/generate-facts", post(api::facts::generate_facts_handler))
        .route("/api/generate-image", post(api::images::generate_image_handler))
        .route("/api/videos/trending", get(api::videos::trending_handler))
        .route("/api/videos/search", get(api::videos::search_handler))
        .route("/api/videos/category/{category}", get(api::videos::category_handler))
        .route("/api/videos/{video_id}", get(api::videos::details_handler))
        .route("/api/webhooks/clerk", post(api::webhooks::clerk_webhook_handler))
        .route(
            "/api/notes",
            get(api::records::list_handler::<Note>).post(api::records::create_handler::<Note>),
        )
        .route(
            "/api/notes/{id}",
            get(api::records::get_handler::<Note>)
                .put(api::records::update_handler::<Note>)
                .delete(api::records::delete_handler::<Note>),
        )
        .route(
            "/api/ideas",
            get(api::records::list_handler::<BusinessIdea>)
                .post(api::records::create_handler::<BusinessIdea>),
        )
        .route(
            "/api/ideas/{id}",
            get(api::records::get_handler::<BusinessIdea>)
                .put(api::records::update_handler::<BusinessIdea>)
                .delete(api::records::delete_handler::<BusinessIdea>),
        )
        .route(
            "/api/library",
            get(api::records::list_handler::<LibraryItem>)
                .post(api::records::create_handler::<LibraryItem>),
        )
        .route(
            "/api/library/{id}",
            get(api::records::get_handler::<LibraryItem>)
                .put(api::records::update_handler::<LibraryItem>)
                .delete(api::library::delete_library_handler),
        )
        .route("/api/library/files", post(api::library::upload_file_handler))
        .route("/api/library/files/{file_name}", get(api::library::serve_file_handler))
        .route("/api/stats", get(api::stats::stats_handler))
        .route(
            "/api/users",
            get(api::users::list_users_handler).post(api::users::create_user_handler),
        )
        .route("/api/sync-user", post(api::users::sync_user_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
