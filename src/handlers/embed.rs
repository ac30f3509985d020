//! Text embedding handler: runs inline text through the ingest pipeline
//! under a synthetic document id.

use crate::app::AppState;
use crate::handlers::{EmbedHandler, response_metadata};
use crate::types::{AppError, EmbedRequest, EmbedResponse, Result};
use async_trait::async_trait;
use tracing::error;
use uuid::Uuid;

pub struct TextEmbedHandler {
    state: AppState,
}

impl TextEmbedHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    async fn run(&self, request: &EmbedRequest) -> Result<EmbedResponse> {
        if request.text.trim().is_empty() {
            return Err(AppError::InvalidInput("No text to embed".to_string()));
        }

        let doc_id = Uuid::new_v4().to_string();
        let name = if request.label.is_empty() {
            "embed".to_string()
        } else {
            request.label.clone()
        };

        self.state
            .pipeline
            .ingest(&doc_id, &name, &request.text, request.metadata.as_ref())
            .await?;

        let token_counts = self.state.counter.take();
        let metadata = response_metadata(&token_counts, vec![], request.metadata.as_ref());

        Ok(EmbedResponse {
            text: Some(request.text.clone()),
            metadata: Some(metadata),
            token_counts,
        })
    }
}

#[async_trait]
impl EmbedHandler for TextEmbedHandler {
    async fn handle(&self, request: EmbedRequest) -> Result<EmbedResponse> {
        self.run(&request).await.map_err(|e| {
            error!("embed handler failed: {}", e);
            self.state.counter.take();
            e
        })
    }
}
