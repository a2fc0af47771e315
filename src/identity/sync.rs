use chrono::{DateTime, Utc};
use mongodb::bson::{doc, Document};

use crate::db::models::{format_timestamp, User, OWNER_FIELD};
use crate::db::repository::DocumentStore;
use crate::error::AppError;
use crate::identity::provider::ExternalUser;

/// Convert provider epoch milliseconds, falling back to `default`.
pub fn provider_timestamp(millis: Option<i64>, default: DateTime<Utc>) -> String {
    let at = millis
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or(default);
    format_timestamp(at)
}

/// Profile fields copied from the provider onto the local user record.
pub fn profile_fields(user: &ExternalUser) -> Document {
    doc! {
        "email": user.primary_email(),
        "first_name": user.first_name(),
        "last_name": user.last_name(),
    }
}

/// Return the local record for `user`, creating it on first sight.
///
/// The lookup and the insert are one atomic upsert keyed on the external id,
/// so concurrent first requests still produce a single record.
pub async fn ensure_user_exists(store: &dyn DocumentStore, user: &ExternalUser) -> Result<User, AppError> {
    if user.id.is_empty() {
        return Err(AppError::BadRequest("User id is required".into()));
    }

    let now = format_timestamp(Utc::now());
    let mut fields = profile_fields(user);
    fields.insert("created_at", now.clone());
    fields.insert("updated_at", now);
    fields.insert("is_active", true);

    let stored = store
        .upsert_by_field(User::COLLECTION, OWNER_FIELD, user.id.clone().into(), fields)
        .await?;

    tracing::debug!(external_id = %user.id, "User record ensured");
    User::from_document(stored)
}
