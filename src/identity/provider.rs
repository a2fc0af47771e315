use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub email_address: String,
}

/// A user as described by the identity provider's API and webhook events.
///
/// Timestamps are Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalUser {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl ExternalUser {
    /// First listed email address, or empty.
    pub fn primary_email(&self) -> &str {
        self.email_addresses
            .first()
            .map(|e| e.email_address.as_str())
            .unwrap_or_default()
    }

    pub fn first_name(&self) -> &str {
        self.first_name.as_deref().unwrap_or_default()
    }

    pub fn last_name(&self) -> &str {
        self.last_name.as_deref().unwrap_or_default()
    }
}

/// Server-side access to the identity provider's user directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn fetch_user(&self, user_id: &str) -> Result<ExternalUser, AppError>;
}

/// IdentityProvider backed by the Clerk backend API.
pub struct ClerkClient {
    http: reqwest::Client,
    api_url: String,
    secret_key: Option<String>,
}

impl ClerkClient {
    pub fn new(api_url: impl Into<String>, secret_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.filter(|k| !k.is_empty()),
        }
    }
}

#[async_trait]
impl IdentityProvider for ClerkClient {
    async fn fetch_user(&self, user_id: &str) -> Result<ExternalUser, AppError> {
        let secret_key = self
            .secret_key
            .as_deref()
            .ok_or_else(|| AppError::Internal("Identity provider secret key is not configured".into()))?;

        let response = self
            .http
            .get(format!("{}/v1/users/{}", self.api_url, user_id))
            .bearer_auth(secret_key)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Identity provider request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Failed to fetch user data from identity provider: {}",
                response.status().as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid identity provider response: {e}")))
    }
}
