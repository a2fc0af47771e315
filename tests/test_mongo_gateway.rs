//! Runs against real MongoDB and MinIO containers.
//!
//! `cargo test -- --ignored` with a Docker daemon available.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use mongodb::bson::{doc, Bson};
use serde_json::{json, Value};
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::minio::MinIO;
use testcontainers_modules::mongo::Mongo;

use notebench::db::repository::{DocumentStore, MongoDocumentStore, Query};
use notebench::storage::client::{S3StorageClient, StorageClient};

/// Running containers plus the gateways wired to them.
///
/// Containers stop when this is dropped.
struct Backends {
    _mongo: ContainerAsync<Mongo>,
    _minio: ContainerAsync<MinIO>,
    store: Arc<dyn DocumentStore>,
    storage: Arc<dyn StorageClient>,
}

impl Backends {
    async fn start() -> Self {
        let (mongo, minio) = tokio::join!(Mongo::default().start(), MinIO::default().start());
        let mongo = mongo.expect("Failed to start MongoDB container");
        let minio = minio.expect("Failed to start MinIO container");

        let mongo_port = mongo
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let mongo_client = mongodb::Client::with_uri_str(format!("mongodb://127.0.0.1:{mongo_port}"))
            .await
            .expect("Failed to connect to MongoDB");
        let store: Arc<dyn DocumentStore> =
            Arc::new(MongoDocumentStore::new(&mongo_client.database("notebench_test")));

        let minio_port = minio
            .get_host_port_ipv4(9000)
            .await
            .expect("Failed to get MinIO port");

        unsafe {
            std::env::set_var("AWS_ACCESS_KEY_ID", "minioadmin");
            std::env::set_var("AWS_SECRET_ACCESS_KEY", "minioadmin");
        }

        let bucket = "notebench-test".to_string();
        let endpoint = format!("http://127.0.0.1:{minio_port}");
        let s3 = S3StorageClient::connect(bucket.clone(), "us-east-1", Some(&endpoint)).await;

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .endpoint_url(&endpoint)
            .region(aws_config::Region::new("us-east-1"))
            .load()
            .await;
        let admin = aws_sdk_s3::Client::from_conf(
            aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(true)
                .build(),
        );
        admin
            .create_bucket()
            .bucket(&bucket)
            .send()
            .await
            .expect("Failed to create test bucket");

        Self {
            _mongo: mongo,
            _minio: minio,
            store,
            storage: Arc::new(s3),
        }
    }
}

#[tokio::test]
#[ignore = "requires docker"]
async fn mongo_store_crud_and_queries() {
    let backends = Backends::start().await;
    let store = backends.store.as_ref();

    let id = store
        .add("notes", doc! { "id": "ignored", "title": "b", "owner_id": "alice", "created_at": "2024-01-02" })
        .await
        .unwrap();
    assert_ne!(id, "ignored");
    store
        .add("notes", doc! { "title": "a", "owner_id": "alice", "created_at": "2024-01-01" })
        .await
        .unwrap();
    store
        .add("notes", doc! { "title": "c", "owner_id": "bob", "created_at": "2024-01-03" })
        .await
        .unwrap();

    let found = store.get_by_id("notes", &id).await.unwrap().unwrap();
    assert_eq!(found.get_str("id").unwrap(), id);
    assert_eq!(found.get_str("title").unwrap(), "b");
    assert!(!found.contains_key("_id"));

    let alices = store
        .query(
            "notes",
            Query::new().eq("owner_id", "alice").order_by("created_at"),
        )
        .await
        .unwrap();
    let titles: Vec<_> = alices.iter().map(|d| d.get_str("title").unwrap()).collect();
    assert_eq!(titles, ["a", "b"]);

    store.update("notes", &id, doc! { "title": "b2" }).await.unwrap();
    let found = store.get_by_id("notes", &id).await.unwrap().unwrap();
    assert_eq!(found.get_str("title").unwrap(), "b2");
    assert_eq!(found.get_str("owner_id").unwrap(), "alice");

    assert!(store.get_by_id("notes", "not-an-object-id").await.unwrap().is_none());

    store.delete("notes", &id).await.unwrap();
    assert!(store.get_by_id("notes", &id).await.unwrap().is_none());
    assert_eq!(store.get_all("notes").await.unwrap().len(), 2);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn mongo_upsert_inserts_once() {
    let backends = Backends::start().await;
    let store = backends.store.as_ref();

    let first = store
        .upsert_by_field("users", "owner_id", Bson::from("user_1"), doc! { "email": "a@x.dev" })
        .await
        .unwrap();
    let second = store
        .upsert_by_field("users", "owner_id", Bson::from("user_1"), doc! { "email": "b@x.dev" })
        .await
        .unwrap();

    assert_eq!(first.get_str("id").unwrap(), second.get_str("id").unwrap());
    assert_eq!(second.get_str("email").unwrap(), "a@x.dev");
    assert_eq!(store.get_all("users").await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn s3_object_lifecycle() {
    let backends = Backends::start().await;
    let storage = backends.storage.as_ref();

    storage
        .put_object("users/alice/library/a.txt", b"alpha".to_vec(), "text/plain")
        .await
        .unwrap();
    storage
        .put_object("users/alice/library/b.txt", b"beta".to_vec(), "text/plain")
        .await
        .unwrap();
    storage
        .put_object("users/bob/library/c.txt", b"gamma".to_vec(), "text/plain")
        .await
        .unwrap();

    assert_eq!(
        storage.get_object("users/alice/library/a.txt").await.unwrap().as_deref(),
        Some(b"alpha".as_slice())
    );
    assert!(storage.get_object("users/alice/library/none.txt").await.unwrap().is_none());

    let mut keys = storage.list_objects("users/alice/").await.unwrap();
    keys.sort();
    assert_eq!(keys, ["users/alice/library/a.txt", "users/alice/library/b.txt"]);

    storage.delete_object("users/alice/library/a.txt").await.unwrap();
    assert!(storage.get_object("users/alice/library/a.txt").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn notes_api_over_real_backends() {
    let backends = Backends::start().await;
    let env = common::TestEnv::with_backends(
        backends.store.clone(),
        backends.storage.clone(),
        common::FakeInference::answering("Keep going."),
    );
    let server = env.server();
    let alice = common::token("user_alice");

    let created = server
        .post("/api/notes")
        .authorization_bearer(&alice)
        .json(&json!({ "title": "Persisted" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    let note: Value = server
        .get(&format!("/api/notes/{id}"))
        .authorization_bearer(&alice)
        .await
        .json();
    assert_eq!(note["data"]["title"], "Persisted");
    assert_eq!(note["data"]["owner_id"], "user_alice");

    server
        .get(&format!("/api/notes/{id}"))
        .authorization_bearer(&common::token("user_bob"))
        .await
        .assert_status_unauthorized();
}
