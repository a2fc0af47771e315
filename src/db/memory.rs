use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};

use crate::db::repository::{DocumentStore, Query, ID_FIELD};
use crate::error::AppError;

/// In-memory DocumentStore used in demo mode and tests.
///
/// Collections are created lazily on first write. Ids are random UUIDs.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<Document>>>, AppError> {
        self.collections
            .lock()
            .map_err(|_| AppError::Database("In-memory store lock poisoned".into()))
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn has_id(doc: &Document, id: &str) -> bool {
    doc.get_str(ID_FIELD).map(|v| v == id).unwrap_or(false)
}

/// Ascending order over the BSON types the application stores.
/// Missing values sort first, like MongoDB.
fn compare_bson(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Bson::String(a), Bson::String(b)) => a.cmp(b),
            (Bson::Boolean(a), Bson::Boolean(b)) => a.cmp(b),
            (Bson::DateTime(a), Bson::DateTime(b)) => a.cmp(b),
            _ => match (as_f64(a), as_f64(b)) {
                (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            },
        },
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_all(&self, collection: &str) -> Result<Vec<Document>, AppError> {
        Ok(self.lock()?.get(collection).cloned().unwrap_or_default())
    }

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        Ok(self
            .lock()?
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| has_id(d, id)).cloned()))
    }

    async fn add(&self, collection: &str, mut data: Document) -> Result<String, AppError> {
        let id = new_id();
        data.insert(ID_FIELD, id.clone());
        self.lock()?
            .entry(collection.to_string())
            .or_default()
            .push(data);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, data: Document) -> Result<(), AppError> {
        let mut collections = self.lock()?;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| has_id(d, id)))
            .ok_or_else(|| AppError::NotFound(format!("No document '{id}' in '{collection}'")))?;

        for (key, value) in data {
            if key != ID_FIELD {
                doc.insert(key, value);
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        if let Some(docs) = self.lock()?.get_mut(collection) {
            docs.retain(|d| !has_id(d, id));
        }
        Ok(())
    }

    async fn query(&self, collection: &str, query: Query) -> Result<Vec<Document>, AppError> {
        let mut matches: Vec<Document> = self
            .lock()?
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| query.filters.iter().all(|f| d.get(&f.field) == Some(&f.value)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(field) = &query.order_by {
            matches.sort_by(|a, b| compare_bson(a.get(field), b.get(field)));
        }

        if let Some(limit) = query.limit {
            matches.truncate(limit.max(0) as usize);
        }

        Ok(matches)
    }

    async fn upsert_by_field(
        &self,
        collection: &str,
        field: &str,
        value: Bson,
        mut data: Document,
    ) -> Result<Document, AppError> {
        let mut collections = self.lock()?;
        let docs = collections.entry(collection.to_string()).or_default();

        if let Some(existing) = docs.iter().find(|d| d.get(field) == Some(&value)) {
            return Ok(existing.clone());
        }

        data.insert(ID_FIELD, new_id());
        data.insert(field, value);
        docs.push(data.clone());
        Ok(data)
    }
}
