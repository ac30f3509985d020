//! Plain chat handler: request history plus the configured system prompt,
//! one completion, updated history back to the caller.

use crate::app::AppState;
use crate::handlers::{QueryHandler, response_metadata};
use crate::types::{ChatMessage, QueryRequest, QueryResponse, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

pub struct ChatHandler {
    state: AppState,
}

impl ChatHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    async fn run(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let mut messages = request.messages.clone().unwrap_or_default();

        // Fresh conversations open with the configured system prompt.
        if messages.is_empty() && !self.state.settings.chat.system_prompt.is_empty() {
            messages.push(ChatMessage::system(
                self.state.settings.chat.system_prompt.clone(),
            ));
        }

        messages.push(ChatMessage::user(request.query.clone()));

        let output = self.state.llm.chat(&messages).await?;
        messages.push(ChatMessage::assistant(output.clone()));

        let token_counts = self.state.counter.take();
        let metadata = response_metadata(
            &token_counts,
            vec![(
                "personality",
                json!(self.state.settings.chat.personality.clone()),
            )],
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
impl QueryHandler for ChatHandler {
    async fn handle(&self, request: QueryRequest) -> QueryResponse {
        match self.run(&request).await {
            Ok(response) => response,
            Err(e) => {
                debug!("chat handler failed: {}", e);
                self.state.counter.take();
                QueryResponse::from_error(&request, &e)
            }
        }
    }
}
