use std::sync::Arc;

use anyhow::Context;
use notebench::app::{router, AppState, Models};
use notebench::auth::session::SessionVerifier;
use notebench::config::Settings;
use notebench::db::memory::MemoryDocumentStore;
use notebench::db::repository::{DocumentStore, MongoDocumentStore};
use notebench::identity::provider::ClerkClient;
use notebench::identity::webhook::WebhookVerifier;
use notebench::inference::client::OpenAiClient;
use notebench::storage::client::{S3StorageClient, StorageClient};
use notebench::storage::memory::MemoryStorageClient;
use notebench::video::client::YouTubeClient;

/// HS256 secret accepted in demo mode when no session key is configured.
const DEMO_SESSION_SECRET: &[u8] = b"notebench-demo-secret";

fn session_verifier(settings: &Settings) -> anyhow::Result<SessionVerifier> {
    let identity = &settings.identity;
    if let Some(pem) = identity.jwt_public_key.as_deref().filter(|k| !k.is_empty()) {
        return Ok(SessionVerifier::from_rsa_pem(pem)?);
    }
    if let Some(secret) = identity.jwt_secret.as_deref().filter(|k| !k.is_empty()) {
        return Ok(SessionVerifier::from_secret(secret.as_bytes()));
    }
    if settings.demo_mode {
        tracing::warn!("No session key configured, accepting demo-signed tokens");
        return Ok(SessionVerifier::from_secret(DEMO_SESSION_SECRET));
    }
    anyhow::bail!("identity.jwt_public_key or identity.jwt_secret must be set")
}

async fn backends(settings: &Settings) -> anyhow::Result<(Arc<dyn DocumentStore>, Arc<dyn StorageClient>)> {
    if settings.demo_mode {
        tracing::info!("Demo mode: using in-memory document and blob stores");
        let document_store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let storage_client: Arc<dyn StorageClient> = Arc::new(MemoryStorageClient::new());
        return Ok((document_store, storage_client));
    }

    let mongo_client = mongodb::Client::with_uri_str(&settings.database.uri)
        .await
        .context("Failed to connect to MongoDB")?;
    let document_store: Arc<dyn DocumentStore> =
        Arc::new(MongoDocumentStore::new(&mongo_client.database(&settings.database.name)));
    tracing::info!(database = %settings.database.name, "Connected to MongoDB");

    let storage_client: Arc<dyn StorageClient> = Arc::new(
        S3StorageClient::connect(
            settings.storage.bucket.clone(),
            &settings.storage.region,
            settings.storage.endpoint.as_deref(),
        )
        .await,
    );
    tracing::info!(bucket = %settings.storage.bucket, "S3 storage client initialized");

    Ok((document_store, storage_client))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notebench=info,tower_http=info".into()),
        )
        .init();

    tracing::info!("Starting notebench server...");

    let settings = Settings::load().context("Failed to load configuration")?;
    let (document_store, storage_client) = backends(&settings).await?;

    let webhook_verifier = match settings.identity.webhook_secret.as_deref().filter(|s| !s.is_empty()) {
        Some(secret) => Some(Arc::new(WebhookVerifier::new(secret)?)),
        None => {
            tracing::warn!("No webhook secret configured, identity webhooks will be refused");
            None
        }
    };

    let state = AppState {
        document_store,
        storage_client,
        inference: Arc::new(OpenAiClient::new(
            settings.openai.base_url.clone(),
            settings.openai.api_key.clone(),
        )),
        videos: Arc::new(YouTubeClient::new(
            settings.youtube.base_url.clone(),
            settings.youtube.api_key.clone(),
        )),
        identity_provider: Arc::new(ClerkClient::new(
            settings.identity.api_url.clone(),
            settings.identity.secret_key.clone(),
        )),
        session_verifier: Arc::new(session_verifier(&settings)?),
        webhook_verifier,
        models: Models {
            chat: settings.openai.chat_model.clone(),
            vision: settings.openai.vision_model.clone(),
            image: settings.openai.image_model.clone(),
        },
    };

    let listener = tokio::net::TcpListener::bind(&settings.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.server.addr))?;
    tracing::info!("Listening on http://{}", settings.server.addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
