//! Memory-augmented chat: conversation history comes from the process-wide
//! [`MemoryManager`](crate::memory::MemoryManager) rather than the request,
//! and both turns of each exchange are recorded back into it.

use crate::app::AppState;
use crate::handlers::{QueryHandler, response_metadata};
use crate::types::{ChatMessage, QueryRequest, QueryResponse, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

pub struct MemoryChatHandler {
    state: AppState,
}

impl MemoryChatHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    async fn run(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let mut messages = Vec::new();
        if !self.state.settings.chat.system_prompt.is_empty() {
            messages.push(ChatMessage::system(
                self.state.settings.chat.system_prompt.clone(),
            ));
        }

        {
            let mut memory = self.state.memory.lock().await;
            messages.extend(memory.history());
            memory.push_user(request.query.clone());
        }
        messages.push(ChatMessage::user(request.query.clone()));

        let output = self.state.llm.chat(&messages).await?;
        messages.push(ChatMessage::assistant(output.clone()));

        let (memory_kind, memory_size) = {
            let mut memory = self.state.memory.lock().await;
            memory.push_assistant(output.clone());
            // Summary memory folds old turns away once the transcript
            // outgrows the verbatim window. The summarization call is part
            // of this request, so its tokens land in this response.
            if memory.needs_condensing() {
                memory.condense(self.state.llm.as_ref()).await?;
            }
            (memory.kind(), memory.len())
        };

        let token_counts = self.state.counter.take();
        let metadata = response_metadata(
            &token_counts,
            vec![
                ("memory_type", json!(memory_kind.as_str())),
                ("memory_size", json!(memory_size)),
            ],
            request.metadata.as_ref(),
        );

        Ok(QueryResponse {
            input: Some(request.query.clone()),
            output: Some(output),
            retrieval_context: None,
            metadata: Some(metadata),
            token_counts,
            messages: Some(messages),
        })
    }
}

#[async_trait]
impl QueryHandler for MemoryChatHandler {
    async fn handle(&self, request: QueryRequest) -> QueryResponse {
        match self.run(&request).await {
            Ok(response) => response,
            Err(e) => {
                debug!("memory handler failed: {}", e);
                self.state.counter.take();
                QueryResponse::from_error(&request, &e)
            }
        }
    }
}

/// Empties the shared conversation memory.
pub struct ClearMemoryHandler {
    state: AppState,
}

impl ClearMemoryHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl QueryHandler for ClearMemoryHandler {
    async fn handle(&self, request: QueryRequest) -> QueryResponse {
        let memory_kind = {
            let mut memory = self.state.memory.lock().await;
            memory.clear();
            memory.kind()
        };

        let mut metadata = crate::types::Metadata::new();
        metadata.insert("memory_type".to_string(), json!(memory_kind.as_str()));
        metadata.insert("memory_size".to_string(), json!(0));

        QueryResponse {
            input: Some(request.query.clone()),
            output: Some("Memory cleared successfully".to_string()),
            retrieval_context: None,
            metadata: Some(metadata),
            token_counts: Default::default(),
            messages: None,
        }
    }
}
