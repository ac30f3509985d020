//! Retrieval-augmented query handler: embed the question, pull the closest
//! chunks (optionally filtered by the request metadata), and answer from
//! that context alone.

use crate::app::AppState;
use crate::handlers::{QueryHandler, response_metadata};
use crate::types::{Metadata, QueryRequest, QueryResponse, Result, RetrievedChunk};
use async_trait::async_trait;
use tracing::debug;

pub struct RagQueryHandler {
    state: AppState,
}

impl RagQueryHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    fn build_prompt(query: &str, chunks: &[RetrievedChunk]) -> String {
        let context = chunks
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "Context information is below.\n\
             ---------------------\n\
             {}\n\
             ---------------------\n\
             Given the context information and not prior knowledge, answer the query.\n\
             Query: {}\n\
             Answer:",
            context, query
        )
    }

    async fn run(&self, request: &QueryRequest) -> Result<QueryResponse> {
        // Request metadata doubles as equality filters over chunk metadata.
        let filters: Metadata = request.metadata.clone().unwrap_or_default();

        let query_embedding = self.state.embedder.embed(&request.query).await?;
        let chunks = self
            .state
            .store
            .search(
                &query_embedding,
                self.state.settings.retrieval.top_k,
                self.state.settings.retrieval.min_score,
                &filters,
            )
            .await?;
        debug!(retrieved = chunks.len(), "retrieval complete");

        let prompt = Self::build_prompt(&request.query, &chunks);
        let output = self
            .state
            .llm
            .generate_with_system(&self.state.settings.chat.system_prompt, &prompt)
            .await?;

        let token_counts = self.state.counter.take();
        let metadata = response_metadata(&token_counts, vec![], request.metadata.as_ref());

        Ok(QueryResponse {
            input: Some(request.query.clone()),
            output: Some(output),
            retrieval_context: Some(chunks),
            metadata: Some(metadata),
            token_counts,
            messages: None,
        })
    }
}

#[async_trait]
impl QueryHandler for RagQueryHandler {
    async fn handle(&self, request: QueryRequest) -> QueryResponse {
        match self.run(&request).await {
            Ok(response) => response,
            Err(e) => {
                debug!("query handler failed: {}", e);
                self.state.counter.take();
                QueryResponse::from_error(&request, &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prompt_contains_context_and_query() {
        let chunks = vec![
            RetrievedChunk {
                text: "Paris is the capital of France.".to_string(),
                metadata: Metadata::new(),
                score: 0.9,
            },
            RetrievedChunk {
                text: "France is in Europe.".to_string(),
                metadata: {
                    let mut m = Metadata::new();
                    m.insert("source".to_string(), json!("geo"));
                    m
                },
                score: 0.7,
            },
        ];

        let prompt = RagQueryHandler::build_prompt("What is the capital of France?", &chunks);
        assert!(prompt.contains("Paris is the capital of France."));
        assert!(prompt.contains("France is in Europe."));
        assert!(prompt.contains("Query: What is the capital of France?"));
        assert!(prompt.contains("not prior knowledge"));
    }

    #[test]
    fn test_prompt_with_no_context() {
        let prompt = RagQueryHandler::build_prompt("anything?", &[]);
        assert!(prompt.contains("Query: anything?"));
    }
}
