//! Document storage handler: decode the uploaded bytes, run them through the
//! ingest pipeline, and report status plus token usage. Deletion removes
//! every chunk indexed under the document id.

use crate::app::AppState;
use crate::handlers::{StorageHandler, response_metadata};
use crate::rag::IngestPipeline;
use crate::types::{Result, StorageRequest, StorageResponse};
use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info};

pub struct DocumentStorageHandler {
    state: AppState,
}

impl DocumentStorageHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    async fn run(&self, request: &StorageRequest) -> Result<StorageResponse> {
        let text = IngestPipeline::decode(
            &request.name,
            request.extension.as_deref(),
            &request.data,
        )?;

        let report = self
            .state
            .pipeline
            .ingest(
                &request.id.to_string(),
                &request.name,
                &text,
                request.metadata.as_ref(),
            )
            .await?;
        info!(id = request.id, chunks = report.chunks_indexed, "document stored");

        let token_counts = self.state.counter.take();
        let mut extra = vec![
            ("document_count", json!(report.chunks_indexed)),
            ("file_name", json!(request.name.clone())),
        ];
        if let Some(title) = &report.title {
            extra.push(("title", json!(title)));
        }
        let metadata = response_metadata(&token_counts, extra, request.metadata.as_ref());

        Ok(StorageResponse::complete(request.id, metadata, token_counts))
    }
}

#[async_trait]
impl StorageHandler for DocumentStorageHandler {
    async fn handle(&self, request: StorageRequest) -> StorageResponse {
        match self.run(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!(id = request.id, "storage handler failed: {}", e);
                self.state.counter.take();
                StorageResponse::error(request.id, &e)
            }
        }
    }

    async fn handle_delete(&self, request: StorageRequest) -> Result<()> {
        let removed = self
            .state
            .store
            .delete_document(&request.id.to_string())
            .await?;
        info!(id = request.id, removed, "document deleted");
        Ok(())
    }
}
