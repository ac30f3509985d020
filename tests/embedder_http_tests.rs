//! OpenAI embedder against a stubbed embeddings endpoint.

use serde_json::json;
use skillet::embedding::{Embedder, OpenAiEmbedder};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn embedder_for(server: &MockServer) -> OpenAiEmbedder {
    OpenAiEmbedder::with_api_base(
        server.uri(),
        "sk-test".to_string(),
        "text-embedding-3-small".to_string(),
        3,
    )
}

#[tokio::test]
async fn embed_batch_parses_vectors_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "text-embedding-3-small",
            "input": ["first", "second"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "embedding": [0.1, 0.2, 0.3] },
                { "embedding": [0.4, 0.5, 0.6] }
            ]
        })))
        .mount(&server)
        .await;

    let embedder = embedder_for(&server);
    let vectors = embedder.embed_batch(&["first", "second"]).await.unwrap();

    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0], vec![0.1, 0.2, 0.3]);
    assert_eq!(vectors[1], vec![0.4, 0.5, 0.6]);
}

#[tokio::test]
async fn embed_single_returns_one_vector() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [ { "embedding": [1.0, 0.0, 0.0] } ]
        })))
        .mount(&server)
        .await;

    let embedder = embedder_for(&server);
    let vector = embedder.embed("only one").await.unwrap();
    assert_eq!(vector, vec![1.0, 0.0, 0.0]);
}

#[tokio::test]
async fn rate_limit_surfaces_as_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let embedder = embedder_for(&server);
    let err = embedder.embed("anything").await.unwrap_err();
    assert!(err.to_string().contains("Rate limited"));
}

#[tokio::test]
async fn server_error_includes_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let embedder = embedder_for(&server);
    let err = embedder.embed("anything").await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("500"));
    assert!(message.contains("upstream exploded"));
}

#[tokio::test]
async fn mismatched_count_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [ { "embedding": [0.1, 0.2, 0.3] } ]
        })))
        .mount(&server)
        .await;

    let embedder = embedder_for(&server);
    let err = embedder.embed_batch(&["one", "two"]).await.unwrap_err();
    assert!(err.to_string().contains("Expected 2 embeddings"));
}

#[tokio::test]
async fn empty_batch_makes_no_request() {
    // No mock mounted: a request would 404 and fail the call.
    let server = MockServer::start().await;
    let embedder = embedder_for(&server);

    let vectors = embedder.embed_batch(&[]).await.unwrap();
    assert!(vectors.is_empty());
}
