mod common;

use notebench::api::quote::FALLBACK_QUOTES;
use notebench::inference::client::MessageContent;
use serde_json::{json, Value};

#[tokio::test]
async fn quote_from_model() {
    let env = common::TestEnv::with_inference(common::FakeInference::answering("Ship it today."));
    let server = env.server();

    let response = server.get("/api/quote").await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "quote": "Ship it today.", "success": true })
    );

    let requests = env.inference.chat_requests.lock().unwrap();
    assert_eq!(requests[0].model, "gpt-3.5-turbo");
    assert_eq!(requests[0].max_tokens, 100);
}

#[tokio::test]
async fn quote_falls_back_when_model_fails() {
    let env = common::TestEnv::with_inference(common::FakeInference::failing());
    let server = env.server();

    let response = server.get("/api/quote").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["fallback"], true);
    let quote = body["quote"].as_str().unwrap();
    assert!(FALLBACK_QUOTES.contains(&quote), "unexpected quote: {quote}");
}

#[tokio::test]
async fn facts_in_french() {
    let env = common::TestEnv::with_inference(common::FakeInference::answering("1. Un.\n2. Deux.\n3. Trois."));
    let server = env.server();

    let response = server
        .post("/api/generate-facts")
        .json(&json!({ "image_url": "https://img.example/fox.jpg", "language": "french" }))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({
            "success": true,
            "facts": "1. Un.\n2. Deux.\n3. Trois.",
            "language": "French",
            "image_url": "https://img.example/fox.jpg",
        })
    );

    let requests = env.inference.chat_requests.lock().unwrap();
    assert_eq!(requests[0].model, "gpt-4o");
    match &requests[0].messages[1].content {
        MessageContent::Parts(parts) => assert_eq!(parts.len(), 2),
        other => panic!("Expected an image message, got: {:?}", other),
    }
}

#[tokio::test]
async fn facts_fall_back_to_fixed_sentences() {
    let env = common::TestEnv::with_inference(common::FakeInference::failing());
    let server = env.server();

    let response = server
        .post("/api/generate-facts")
        .json(&json!({ "image_url": "https://img.example/fox.jpg", "language": "arabic" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["fallback"], true);
    assert_eq!(body["language"], "Arabic");
    assert_eq!(body["error"], "Using fallback facts due to API error");
    let facts = body["facts"].as_str().unwrap();
    assert_eq!(facts.lines().count(), 3);
    assert!(facts.starts_with("1. تحتوي"));
}

#[tokio::test]
async fn facts_validation() {
    let env = common::TestEnv::new();
    let server = env.server();

    let response = server
        .post("/api/generate-facts")
        .json(&json!({ "language": "english" }))
        .await;
    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"], "Image URL is required");

    server
        .post("/api/generate-facts")
        .json(&json!({ "image_url": "https://img.example/fox.jpg", "language": "klingon" }))
        .await
        .assert_status_bad_request();

    assert!(env.inference.chat_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn videos_fall_back_when_platform_is_down() {
    let env = common::TestEnv::new();
    let server = env.server();

    let trending: Value = server.get("/api/videos/trending").await.json();
    assert_eq!(trending["fallback"], true);
    assert_eq!(trending["videos"].as_array().unwrap().len(), 5);

    let category: Value = server.get("/api/videos/category/gaming").await.json();
    assert_eq!(category["videos"].as_array().unwrap().len(), 5);

    let search: Value = server.get("/api/videos/search").add_query_param("q", "rick").await.json();
    let found = search["videos"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], "dQw4w9WgXcQ");

    let details: Value = server.get("/api/videos/9bZkp7q19f0").await.json();
    assert_eq!(details["video"]["channel_title"], "officialpsy");
    assert_eq!(details["video"]["like_count"], "50000");

    server.get("/api/videos/unknown-id").await.assert_status_not_found();
    server.get("/api/videos/search").await.assert_status_bad_request();
}
