use std::sync::Arc;

use chrono::Utc;
use mongodb::bson::Document;

use crate::db::models::{format_timestamp, CREATED_AT_FIELD, OWNER_FIELD, UPDATED_AT_FIELD};
use crate::db::repository::{DocumentStore, Query, ID_FIELD};
use crate::error::AppError;

/// Owner-scoped access to a DocumentStore.
///
/// Every write is stamped with the caller's identity, and updates/deletes
/// are refused when the stored owner differs from the caller. The checks
/// live here only: anything talking to the store directly bypasses them.
#[derive(Clone)]
pub struct ScopedStore {
    store: Arc<dyn DocumentStore>,
}

impl ScopedStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// The unscoped gateway underneath.
    pub fn inner(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// Insert `data` owned by `owner`, with creation and update timestamps.
    pub async fn add_with_owner(
        &self,
        owner: &str,
        collection: &str,
        mut data: Document,
    ) -> Result<String, AppError> {
        let now = format_timestamp(Utc::now());
        data.remove(ID_FIELD);
        data.insert(OWNER_FIELD, owner);
        data.insert(CREATED_AT_FIELD, now.clone());
        data.insert(UPDATED_AT_FIELD, now);

        let id = self.store.add(collection, data).await?;
        tracing::debug!(collection, id = %id, "Created owned document");
        Ok(id)
    }

    /// Fetch a document, failing unless `owner` owns it.
    pub async fn get_owned_by_id(
        &self,
        owner: &str,
        collection: &str,
        id: &str,
    ) -> Result<Document, AppError> {
        let doc = self
            .store
            .get_by_id(collection, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document '{id}' not found")))?;

        if doc.get_str(OWNER_FIELD).ok() != Some(owner) {
            tracing::warn!(collection, id, "Ownership check failed");
            return Err(AppError::Auth(
                "Unauthorized: you can only access your own documents".into(),
            ));
        }

        Ok(doc)
    }

    /// Merge `data` into a document owned by `owner`.
    ///
    /// The id, owner and creation time cannot be changed through this path.
    pub async fn update_with_owner(
        &self,
        owner: &str,
        collection: &str,
        id: &str,
        mut data: Document,
    ) -> Result<(), AppError> {
        self.get_owned_by_id(owner, collection, id).await?;

        data.remove(ID_FIELD);
        data.remove(OWNER_FIELD);
        data.remove(CREATED_AT_FIELD);
        data.insert(UPDATED_AT_FIELD, format_timestamp(Utc::now()));

        self.store.update(collection, id, data).await
    }

    /// Delete a document owned by `owner`.
    pub async fn delete_with_owner(
        &self,
        owner: &str,
        collection: &str,
        id: &str,
    ) -> Result<(), AppError> {
        self.get_owned_by_id(owner, collection, id).await?;
        self.store.delete(collection, id).await
    }

    /// All documents in `collection` owned by `owner`, oldest first.
    pub async fn get_owned_documents(
        &self,
        owner: &str,
        collection: &str,
    ) -> Result<Vec<Document>, AppError> {
        self.store
            .query(
                collection,
                Query::new().eq(OWNER_FIELD, owner).order_by(CREATED_AT_FIELD),
            )
            .await
    }
}
