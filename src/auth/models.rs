use serde::{Deserialize, Serialize};

/// The caller of a request, as asserted by a verified session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Identity-provider user id (the token subject). Used as the owner of
    /// every document and file the caller creates.
    pub user_id: String,
    /// Email address, when the token carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl AuthenticatedUser {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
        }
    }

    /// Owner value stamped on documents.
    pub fn owner(&self) -> &str {
        &self.user_id
    }
}
