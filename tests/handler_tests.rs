//! End-to-end handler flows over mock clients: no network, no broker.

mod common;

use common::mocks::MockLlm;
use serde_json::json;
use skillet::app::{AppState, HandlerRegistry};
use skillet::bus::{self, Route};
use skillet::db::LocalVectorStore;
use skillet::embedding::HashEmbedder;
use skillet::handlers::{
    ChatHandler, ClearMemoryHandler, DocumentStorageHandler, EmbedHandler, MemoryChatHandler,
    QueryHandler, RagQueryHandler, ReactHandler, StorageHandler, TextEmbedHandler,
};
use skillet::memory::MemoryKind;
use skillet::types::{
    ChatMessage, EmbedRequest, MessageRole, Metadata, QueryRequest, QueryResponse, StorageRequest,
    StorageStatus,
};
use skillet::{Settings, VectorStore};
use std::sync::Arc;

fn test_state(llm: MockLlm) -> AppState {
    let mut settings = Settings::default();
    settings.chat.system_prompt = "You are a helpful assistant.".to_string();
    settings.ingest.chunk_size = 120;
    settings.ingest.chunk_overlap = 10;
    state_with_settings(settings, llm)
}

fn state_with_settings(settings: Settings, llm: MockLlm) -> AppState {
    AppState::from_parts(
        settings,
        Box::new(llm),
        Box::new(HashEmbedder::new(64)),
        Arc::new(LocalVectorStore::in_memory()),
    )
    .unwrap()
}

fn storage_request(id: i64, name: &str, body: &str) -> StorageRequest {
    StorageRequest {
        id,
        name: name.to_string(),
        label: "storage".to_string(),
        data: body.as_bytes().to_vec(),
        metadata: None,
        extension: None,
    }
}

// ============= chat =============

#[tokio::test]
async fn chat_adds_system_prompt_and_updates_history() {
    let state = test_state(MockLlm::new("Hello! How can I help?"));
    let handler = ChatHandler::new(state);

    let response = handler.handle(QueryRequest::new("hi there", "chat")).await;

    assert_eq!(response.input.as_deref(), Some("hi there"));
    assert_eq!(response.output.as_deref(), Some("Hello! How can I help?"));

    let messages = response.messages.unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].role, MessageRole::System);
    assert_eq!(messages[1].content, "hi there");
    assert_eq!(messages[2].role, MessageRole::Assistant);

    assert!(response.token_counts.llm_prompt_tokens.unwrap() > 0);
    assert!(response.token_counts.llm_completion_tokens.unwrap() > 0);
    assert!(response.token_counts.embedding_tokens.is_none());
}

#[tokio::test]
async fn chat_with_existing_history_skips_system_prompt() {
    let state = test_state(MockLlm::new("Continuing."));
    let handler = ChatHandler::new(state);

    let mut request = QueryRequest::new("and then?", "chat");
    request.messages = Some(vec![
        ChatMessage::user("tell me a story"),
        ChatMessage::assistant("Once upon a time..."),
    ]);

    let response = handler.handle(request).await;
    let messages = response.messages.unwrap();

    assert_eq!(messages.len(), 4);
    assert!(messages.iter().all(|m| m.role != MessageRole::System));
}

#[tokio::test]
async fn chat_merges_caller_metadata() {
    let state = test_state(MockLlm::new("ok"));
    let handler = ChatHandler::new(state);

    let mut request = QueryRequest::new("hi", "chat");
    let mut metadata = Metadata::new();
    metadata.insert("session".to_string(), json!("abc-123"));
    request.metadata = Some(metadata);

    let response = handler.handle(request).await;
    let metadata = response.metadata.unwrap();

    assert_eq!(metadata["session"], json!("abc-123"));
    assert_eq!(metadata["personality"], json!("assistant"));
    assert!(metadata["token_counts"]["llm_prompt_tokens"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn chat_failure_is_shaped_into_the_response() {
    let state = test_state(MockLlm::failing());
    let counter = state.counter.clone();
    let handler = ChatHandler::new(state);

    let response = handler.handle(QueryRequest::new("hi", "chat")).await;

    assert!(response.output.unwrap().starts_with("Error: "));
    assert!(response.token_counts.is_empty());
    // The shared counter was drained, nothing leaks into the next request.
    assert!(counter.snapshot().is_empty());
}

// ============= memory =============

#[tokio::test]
async fn memory_chat_accumulates_across_requests() {
    let state = test_state(MockLlm::scripted(vec!["First answer.", "Second answer."]));
    let handler = MemoryChatHandler::new(state.clone());

    let first = handler.handle(QueryRequest::new("first question", "memory")).await;
    let first_meta = first.metadata.unwrap();
    assert_eq!(first_meta["memory_type"], json!("buffer"));
    assert_eq!(first_meta["memory_size"], json!(2));

    let second = handler.handle(QueryRequest::new("second question", "memory")).await;
    let second_meta = second.metadata.unwrap();
    assert_eq!(second_meta["memory_size"], json!(4));

    // The second request's prompt included the remembered first exchange.
    let messages = second.messages.unwrap();
    assert!(messages.iter().any(|m| m.content == "first question"));
    assert!(messages.iter().any(|m| m.content == "First answer."));
}

#[tokio::test]
async fn clear_memory_empties_the_conversation() {
    let state = test_state(MockLlm::new("answer"));
    let chat = MemoryChatHandler::new(state.clone());
    let clear = ClearMemoryHandler::new(state.clone());

    chat.handle(QueryRequest::new("remember me", "memory")).await;
    assert_eq!(state.memory.lock().await.len(), 2);

    let response = clear.handle(QueryRequest::new("", "clear_memory")).await;
    assert_eq!(response.output.as_deref(), Some("Memory cleared successfully"));
    assert_eq!(response.metadata.unwrap()["memory_size"], json!(0));
    assert_eq!(state.memory.lock().await.len(), 0);
}

#[tokio::test]
async fn summary_memory_condenses_long_conversations() {
    let mut settings = Settings::default();
    settings.memory.kind = MemoryKind::Summary;
    settings.memory.window = 1;
    let state = state_with_settings(settings, MockLlm::new("The reply."));
    let handler = MemoryChatHandler::new(state.clone());

    for i in 0..4 {
        handler
            .handle(QueryRequest::new(format!("question {}", i), "memory"))
            .await;
    }

    let memory = state.memory.lock().await;
    let history = memory.history();
    // A summary system message now stands in for the older exchanges.
    assert_eq!(history[0].role, MessageRole::System);
    assert!(history[0].content.contains("Summary of the conversation"));
    assert!(history.len() <= 3);
}

// ============= react =============

#[tokio::test]
async fn react_executes_tool_then_answers() {
    let state = test_state(MockLlm::scripted(vec![
        "Thought: I need to calculate\nAction: calculator\nInput: 6 * 7",
        "The answer is 42.",
    ]));
    let handler = ReactHandler::new(state);

    let response = handler.handle(QueryRequest::new("what is 6 * 7?", "react")).await;

    assert_eq!(response.output.as_deref(), Some("The answer is 42."));

    let metadata = response.metadata.unwrap();
    let usage = metadata["tool_usage"].as_array().unwrap();
    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0]["tool"], json!("calculator"));
    assert_eq!(usage[0]["input"], json!("6 * 7"));
    assert_eq!(usage[0]["output"], json!("42"));

    // Transcript: system, user, tool-call, tool result, final answer.
    let messages = response.messages.unwrap();
    assert_eq!(messages.len(), 5);
    assert!(messages[3].content.starts_with("Tool result: 42"));
}

#[tokio::test]
async fn react_without_tool_call_is_single_shot() {
    let state = test_state(MockLlm::new("Just an answer."));
    let handler = ReactHandler::new(state);

    let response = handler.handle(QueryRequest::new("hello", "react")).await;

    assert_eq!(response.output.as_deref(), Some("Just an answer."));
    let metadata = response.metadata.unwrap();
    assert!(metadata["tool_usage"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn react_treats_unknown_tool_as_final_answer() {
    let state = test_state(MockLlm::new(
        "Thought: hmm\nAction: teleporter\nInput: far away",
    ));
    let handler = ReactHandler::new(state);

    let response = handler.handle(QueryRequest::new("go", "react")).await;

    assert!(response.output.unwrap().contains("teleporter"));
    let metadata = response.metadata.unwrap();
    assert!(metadata["tool_usage"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn react_stops_at_max_steps() {
    // The model asks for a tool every single time.
    let state = test_state(MockLlm::new(
        "Thought: again\nAction: search\nInput: more data",
    ));
    let max_steps = state.settings.react.max_steps;
    let handler = ReactHandler::new(state);

    let response = handler.handle(QueryRequest::new("loop forever", "react")).await;

    let metadata = response.metadata.unwrap();
    assert_eq!(
        metadata["tool_usage"].as_array().unwrap().len(),
        max_steps
    );
}

#[tokio::test]
async fn react_feeds_tool_errors_back_as_observations() {
    let state = test_state(MockLlm::scripted(vec![
        "Action: calculator\nInput: not math",
        "I could not compute that.",
    ]));
    let handler = ReactHandler::new(state);

    let response = handler.handle(QueryRequest::new("calc", "react")).await;

    assert_eq!(response.output.as_deref(), Some("I could not compute that."));
    let metadata = response.metadata.unwrap();
    let usage = metadata["tool_usage"].as_array().unwrap();
    assert!(usage[0]["output"].as_str().unwrap().starts_with("Error:"));
}

// ============= storage + query (RAG round trip) =============

#[tokio::test]
async fn storage_then_query_retrieves_indexed_context() {
    let state = test_state(MockLlm::new("Paris, according to the context."));
    let storage = DocumentStorageHandler::new(state.clone());
    let query = RagQueryHandler::new(state.clone());

    let response = storage
        .handle(storage_request(
            1,
            "geography.txt",
            "Paris is the capital of France. The Seine flows through Paris.",
        ))
        .await;
    assert_eq!(response.status, StorageStatus::Complete);
    let metadata = response.metadata.unwrap();
    assert_eq!(metadata["file_name"], json!("geography.txt"));
    assert!(metadata["document_count"].as_u64().unwrap() >= 1);
    assert!(response.token_counts.embedding_tokens.unwrap() > 0);

    let response = query
        .handle(QueryRequest::new("What is the capital of France?", "query"))
        .await;

    assert_eq!(
        response.output.as_deref(),
        Some("Paris, according to the context.")
    );
    let context = response.retrieval_context.unwrap();
    assert!(!context.is_empty());
    assert!(context[0].text.contains("Paris"));
    assert_eq!(context[0].metadata["doc_id"], json!("1"));

    // Both the query embedding and the completion were accounted.
    assert!(response.token_counts.embedding_tokens.unwrap() > 0);
    assert!(response.token_counts.total_llm_tokens.unwrap() > 0);
}

#[tokio::test]
async fn query_metadata_acts_as_retrieval_filter() {
    let state = test_state(MockLlm::new("Answer from filtered context."));
    let storage = DocumentStorageHandler::new(state.clone());
    let query = RagQueryHandler::new(state.clone());

    let mut geo = storage_request(1, "geo.txt", "Paris is the capital of France.");
    let mut meta = Metadata::new();
    meta.insert("source".to_string(), json!("geo"));
    geo.metadata = Some(meta);
    storage.handle(geo).await;

    let mut tech = storage_request(2, "tech.txt", "Paris is also a web framework.");
    let mut meta = Metadata::new();
    meta.insert("source".to_string(), json!("tech"));
    tech.metadata = Some(meta);
    storage.handle(tech).await;

    let mut request = QueryRequest::new("Tell me about Paris", "query");
    let mut filters = Metadata::new();
    filters.insert("source".to_string(), json!("tech"));
    request.metadata = Some(filters);

    let response = query.handle(request).await;
    let context = response.retrieval_context.unwrap();

    assert!(!context.is_empty());
    assert!(context.iter().all(|c| c.metadata["source"] == json!("tech")));
}

#[tokio::test]
async fn storage_rejects_unsupported_file_type() {
    let state = test_state(MockLlm::new("unused"));
    let handler = DocumentStorageHandler::new(state.clone());

    let response = handler.handle(storage_request(5, "report.pdf", "%PDF-1.4")).await;

    assert_eq!(response.status, StorageStatus::Error);
    assert!(response.error.unwrap().contains("Unsupported file type"));
    assert!(state.counter.snapshot().is_empty());
}

#[tokio::test]
async fn storage_delete_removes_document_chunks() {
    let state = test_state(MockLlm::new("unused"));
    let handler = DocumentStorageHandler::new(state.clone());

    handler
        .handle(storage_request(9, "doc.txt", "Some document to remove later."))
        .await;
    assert!(state.store.count().await.unwrap() > 0);

    handler
        .handle_delete(storage_request(9, "doc.txt", ""))
        .await
        .unwrap();
    assert_eq!(state.store.count().await.unwrap(), 0);
}

// ============= embed =============

#[tokio::test]
async fn embed_indexes_text_and_reports_tokens() {
    let state = test_state(MockLlm::new("unused"));
    let handler = TextEmbedHandler::new(state.clone());

    let mut metadata = Metadata::new();
    metadata.insert("category".to_string(), json!("geography"));

    let response = handler
        .handle(EmbedRequest {
            label: "embed".to_string(),
            text: "Paris is the capital of France.".to_string(),
            metadata: Some(metadata),
        })
        .await
        .unwrap();

    assert_eq!(response.text.as_deref(), Some("Paris is the capital of France."));
    assert!(response.token_counts.embedding_tokens.unwrap() > 0);
    assert_eq!(response.metadata.unwrap()["category"], json!("geography"));
    assert_eq!(state.store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn embed_rejects_empty_text() {
    let state = test_state(MockLlm::new("unused"));
    let handler = TextEmbedHandler::new(state);

    let result = handler
        .handle(EmbedRequest {
            label: "embed".to_string(),
            text: "   ".to_string(),
            metadata: None,
        })
        .await;

    assert!(result.is_err());
}

// ============= registry + dispatch =============

#[tokio::test]
async fn dispatch_routes_to_registered_handler() {
    let state = test_state(MockLlm::new("Dispatched reply."));
    let registry = HandlerRegistry::with_default_handlers(&state);

    let payload = serde_json::to_vec(&QueryRequest::new("hello", "chat")).unwrap();
    let reply = bus::dispatch(&registry, Route::Query("chat".to_string()), &payload).await;
    let response: QueryResponse = serde_json::from_slice(&reply).unwrap();

    assert_eq!(response.output.as_deref(), Some("Dispatched reply."));
}

#[tokio::test]
async fn default_registry_covers_all_labels() {
    let state = test_state(MockLlm::new("ok"));
    let registry = HandlerRegistry::with_default_handlers(&state);

    for label in ["chat", "memory", "clear_memory", "react", "query"] {
        assert!(registry.query_handler(label).is_some(), "missing {}", label);
    }
    assert!(registry.storage_handler("storage").is_some());
    assert!(registry.embed_handler("embed").is_some());
}
