//! Request handlers.
//!
//! Each handler assembles a prompt or message list, delegates to the LLM
//! client and/or vector store, and shapes the result into the fixed response
//! schema. Query-style handlers never fail outward: errors are stringified
//! into the response (`output: "Error: ..."`), and the shared token counter
//! is drained on every path so usage never leaks into the next request.

use crate::types::{
    EmbedRequest, EmbedResponse, Metadata, QueryRequest, QueryResponse, Result, StorageRequest,
    StorageResponse, TokenCounts,
};
use async_trait::async_trait;
use serde_json::Value;

pub mod chat;
pub mod embed;
pub mod memory;
pub mod query;
pub mod react;
pub mod storage;

pub use chat::ChatHandler;
pub use embed::TextEmbedHandler;
pub use memory::{ClearMemoryHandler, MemoryChatHandler};
pub use query::RagQueryHandler;
pub use react::ReactHandler;
pub use storage::DocumentStorageHandler;

/// Handler for `query`-class requests (chat, memory, react, rag).
#[async_trait]
pub trait QueryHandler: Send + Sync {
    async fn handle(&self, request: QueryRequest) -> QueryResponse;
}

/// Handler for document ingestion and deletion.
#[async_trait]
pub trait StorageHandler: Send + Sync {
    async fn handle(&self, request: StorageRequest) -> StorageResponse;

    async fn handle_delete(&self, request: StorageRequest) -> Result<()>;
}

/// Handler for text embedding requests.
#[async_trait]
pub trait EmbedHandler: Send + Sync {
    async fn handle(&self, request: EmbedRequest) -> Result<EmbedResponse>;
}

/// Response metadata: token counts, handler-specific entries, then the
/// caller's metadata merged over the top (caller keys win).
pub(crate) fn response_metadata(
    token_counts: &TokenCounts,
    extra: Vec<(&str, Value)>,
    request_metadata: Option<&Metadata>,
) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("token_counts".to_string(), token_counts.to_metadata());
    for (key, value) in extra {
        metadata.insert(key.to_string(), value);
    }
    if let Some(request_metadata) = request_metadata {
        for (key, value) in request_metadata {
            metadata.insert(key.clone(), value.clone());
        }
    }
    metadata
}
