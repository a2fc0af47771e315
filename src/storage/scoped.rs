use std::sync::Arc;

use crate::error::AppError;
use crate::storage::client::StorageClient;

/// Blob storage rooted at `users/{owner}/`.
#[derive(Clone)]
pub struct UserFiles {
    storage: Arc<dyn StorageClient>,
}

/// Object key for `path` inside `owner`'s area.
pub fn user_path(owner: &str, path: &str) -> String {
    format!("users/{}/{}", owner, path.trim_start_matches('/'))
}

/// Path of a library file relative to its owner's area.
pub fn library_path(file_name: &str) -> String {
    format!("library/{}", file_name)
}

/// Replace everything but alphanumerics, `.` and `-` so a client-supplied
/// name cannot escape its directory.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();

    match sanitized.trim_matches('.') {
        "" => "upload.bin".to_string(),
        _ => sanitized,
    }
}

impl UserFiles {
    pub fn new(storage: Arc<dyn StorageClient>) -> Self {
        Self { storage }
    }

    /// Store `content` at `users/{owner}/{path}` and return the object key.
    pub async fn upload_user_file(
        &self,
        owner: &str,
        path: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        let key = user_path(owner, path);
        self.storage.put_object(&key, content, content_type).await?;
        tracing::debug!(key = %key, "Uploaded user file");
        Ok(key)
    }

    pub async fn get_user_file(&self, owner: &str, path: &str) -> Result<Option<Vec<u8>>, AppError> {
        self.storage.get_object(&user_path(owner, path)).await
    }

    /// Keys of every file under `users/{owner}/{path}`.
    pub async fn get_user_files(&self, owner: &str, path: &str) -> Result<Vec<String>, AppError> {
        self.storage.list_objects(&user_path(owner, path)).await
    }

    pub async fn delete_user_file(&self, owner: &str, path: &str) -> Result<(), AppError> {
        let key = user_path(owner, path);
        self.storage.delete_object(&key).await?;
        tracing::debug!(key = %key, "Deleted user file");
        Ok(())
    }
}
