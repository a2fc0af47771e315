use async_trait::async_trait;
use mongodb::bson::{Bson, Document};

use crate::error::AppError;

/// Name of the identifier field exposed on every document returned by a store.
pub const ID_FIELD: &str = "id";

/// A single equality predicate (`field == value`).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Bson,
}

/// Filtered query over a single collection.
///
/// All filters are equality predicates and are combined with AND. Ordering
/// is ascending on `order_by` when set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<String>,
    pub limit: Option<i64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality filter.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Document database gateway.
///
/// Every method maps to exactly one store operation, with no retries and no
/// batching. Documents are returned with their identifier as a string `id`
/// field. Abstracted as a trait so tests and demo mode can run in memory.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in a collection.
    async fn get_all(&self, collection: &str) -> Result<Vec<Document>, AppError>;

    /// A single document, or `None` if no document has this id.
    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError>;

    /// Insert a new document and return its generated id.
    async fn add(&self, collection: &str, data: Document) -> Result<String, AppError>;

    /// Merge `data` into an existing document. Fails with `NotFound` if the id is unknown.
    async fn update(&self, collection: &str, id: &str, data: Document) -> Result<(), AppError>;

    /// Delete a document. Deleting a missing id is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError>;

    /// Run an equality-filtered query.
    async fn query(&self, collection: &str, query: Query) -> Result<Vec<Document>, AppError>;

    /// Atomically return the document where `field == value`, inserting
    /// `data` (plus the key field) when no such document exists.
    async fn upsert_by_field(
        &self,
        collection: &str,
        field: &str,
        value: Bson,
        data: Document,
    ) -> Result<Document, AppError>;
}

/// MongoDB implementation of the DocumentStore.
pub struct MongoDocumentStore {
    db: mongodb::Database,
}

impl MongoDocumentStore {
    pub fn new(db: &mongodb::Database) -> Self {
        Self { db: db.clone() }
    }

    fn collection(&self, name: &str) -> mongodb::Collection<Document> {
        self.db.collection(name)
    }
}

/// Parse a string id into an ObjectId. Ids that are not valid ObjectIds can
/// never match a stored document.
fn parse_object_id(id: &str) -> Option<mongodb::bson::oid::ObjectId> {
    mongodb::bson::oid::ObjectId::parse_str(id).ok()
}

/// Replace MongoDB's `_id` with a hex string `id`.
fn expose_id(mut doc: Document) -> Document {
    if let Some(raw) = doc.remove("_id") {
        let id = match raw {
            Bson::ObjectId(oid) => oid.to_hex(),
            other => other.to_string(),
        };
        doc.insert(ID_FIELD, id);
    }
    doc
}

fn db_err(e: mongodb::error::Error) -> AppError {
    AppError::Database(e.to_string())
}

async fn collect(mut cursor: mongodb::Cursor<Document>) -> Result<Vec<Document>, AppError> {
    use futures::TryStreamExt;

    let mut documents = Vec::new();
    while let Some(doc) = cursor.try_next().await.map_err(db_err)? {
        documents.push(expose_id(doc));
    }
    Ok(documents)
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn get_all(&self, collection: &str) -> Result<Vec<Document>, AppError> {
        use mongodb::bson::doc;

        let cursor = self
            .collection(collection)
            .find(doc! {})
            .await
            .map_err(db_err)?;

        collect(cursor).await
    }

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        use mongodb::bson::doc;

        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };

        let found = self
            .collection(collection)
            .find_one(doc! { "_id": oid })
            .await
            .map_err(db_err)?;

        Ok(found.map(expose_id))
    }

    async fn add(&self, collection: &str, mut data: Document) -> Result<String, AppError> {
        data.remove(ID_FIELD);

        let result = self
            .collection(collection)
            .insert_one(data)
            .await
            .map_err(db_err)?;

        match result.inserted_id {
            Bson::ObjectId(oid) => Ok(oid.to_hex()),
            other => Ok(other.to_string()),
        }
    }

    async fn update(&self, collection: &str, id: &str, mut data: Document) -> Result<(), AppError> {
        use mongodb::bson::doc;

        let oid = parse_object_id(id)
            .ok_or_else(|| AppError::NotFound(format!("No document '{id}' in '{collection}'")))?;
        data.remove(ID_FIELD);

        let result = self
            .collection(collection)
            .update_one(doc! { "_id": oid }, doc! { "$set": data })
            .await
            .map_err(db_err)?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "No document '{id}' in '{collection}'"
            )));
        }

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        use mongodb::bson::doc;

        let Some(oid) = parse_object_id(id) else {
            return Ok(());
        };

        self.collection(collection)
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(db_err)?;

        Ok(())
    }

    async fn query(&self, collection: &str, query: Query) -> Result<Vec<Document>, AppError> {
        use mongodb::options::FindOptions;

        let mut filter = Document::new();
        for f in query.filters {
            filter.insert(f.field, f.value);
        }

        let sort = query.order_by.map(|field| {
            let mut sort = Document::new();
            sort.insert(field, 1);
            sort
        });

        let options = FindOptions::builder()
            .sort(sort)
            .limit(query.limit)
            .build();

        let cursor = self
            .collection(collection)
            .find(filter)
            .with_options(options)
            .await
            .map_err(db_err)?;

        collect(cursor).await
    }

    async fn upsert_by_field(
        &self,
        collection: &str,
        field: &str,
        value: Bson,
        mut data: Document,
    ) -> Result<Document, AppError> {
        use mongodb::bson::doc;
        use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

        // The key comes from the filter on insert; setting it twice is a conflict.
        data.remove(field);
        data.remove(ID_FIELD);

        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let mut filter = Document::new();
        filter.insert(field, value);

        let found = self
            .collection(collection)
            .find_one_and_update(filter, doc! { "$setOnInsert": data })
            .with_options(options)
            .await
            .map_err(db_err)?;

        found
            .map(expose_id)
            .ok_or_else(|| AppError::Database("Upsert returned no document".into()))
    }
}
