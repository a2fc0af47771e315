use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AppError;
use crate::storage::client::StorageClient;

/// In-memory StorageClient used in demo mode and tests.
#[derive(Default)]
pub struct MemoryStorageClient {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorageClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>>, AppError> {
        self.objects
            .lock()
            .map_err(|_| AppError::Storage("In-memory storage lock poisoned".into()))
    }
}

#[async_trait]
impl StorageClient for MemoryStorageClient {
    async fn put_object(&self, key: &str, content: Vec<u8>, _content_type: &str) -> Result<(), AppError> {
        self.lock()?.insert(key.to_string(), content);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn delete_object(&self, key: &str) -> Result<(), AppError> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        Ok(self
            .lock()?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
