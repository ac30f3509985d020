//! Document ingest pipeline: decode, chunk, extract, embed, index.

use crate::db::vectorstore::{ChunkRecord, VectorStore};
use crate::embedding::Embedder;
use crate::llm::LlmClient;
use crate::rag::chunker::Chunker;
use crate::types::{AppError, Metadata, Result};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Extensions decoded as utf-8 text. Anything else fails the request;
/// binary formats (PDF and friends) need a parsing service this crate does
/// not ship.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "rst", "csv", "json", "yaml", "yml", "html", "htm",
];

/// Outcome of one ingest run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub chunks_indexed: usize,
    pub title: Option<String>,
}

pub struct IngestPipeline {
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmClient>,
    extract_titles: bool,
}

impl IngestPipeline {
    pub fn new(
        chunker: Chunker,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LlmClient>,
        extract_titles: bool,
    ) -> Self {
        Self {
            chunker,
            embedder,
            store,
            llm,
            extract_titles,
        }
    }

    /// Decode uploaded bytes into text, gated on a known-text extension.
    pub fn decode(name: &str, extension: Option<&str>, data: &[u8]) -> Result<String> {
        let ext = extension
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .or_else(|| {
                name.rsplit_once('.')
                    .map(|(_, e)| e.to_ascii_lowercase())
            })
            .unwrap_or_default();

        if !TEXT_EXTENSIONS.contains(&ext.as_str()) {
            return Err(AppError::Ingest(format!(
                "Unsupported file type '{}' for '{}'. Supported: {}",
                ext,
                name,
                TEXT_EXTENSIONS.join(", ")
            )));
        }

        String::from_utf8(data.to_vec())
            .map_err(|_| AppError::Ingest(format!("'{}' is not valid utf-8", name)))
    }

    /// Chunk, optionally title, embed, and index one document.
    ///
    /// Chunk ids are `{doc_id}:{index}`, so re-ingesting a document replaces
    /// its previous chunks in place.
    pub async fn ingest(
        &self,
        doc_id: &str,
        file_name: &str,
        text: &str,
        metadata: Option<&Metadata>,
    ) -> Result<IngestReport> {
        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            return Err(AppError::Ingest(format!(
                "'{}' produced no indexable text",
                file_name
            )));
        }

        let title = if self.extract_titles {
            self.extract_title(chunks[0]).await
        } else {
            None
        };

        let embeddings = self.embedder.embed_batch(&chunks).await?;

        let records: Vec<ChunkRecord> = chunks
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (chunk_text, embedding))| {
                let mut chunk_metadata = metadata.cloned().unwrap_or_default();
                chunk_metadata.insert("doc_id".to_string(), json!(doc_id));
                chunk_metadata.insert("file_name".to_string(), json!(file_name));
                chunk_metadata.insert("chunk".to_string(), json!(index));
                chunk_metadata.insert(
                    "indexed_at".to_string(),
                    json!(chrono::Utc::now().to_rfc3339()),
                );
                if let Some(title) = &title {
                    chunk_metadata.insert("title".to_string(), json!(title));
                }

                ChunkRecord {
                    id: format!("{}:{}", doc_id, index),
                    doc_id: doc_id.to_string(),
                    text: chunk_text.to_string(),
                    metadata: chunk_metadata,
                    embedding,
                }
            })
            .collect();

        let written = self.store.upsert(&records).await?;
        debug!(doc_id, chunks = written, "indexed document");

        Ok(IngestReport {
            chunks_indexed: written,
            title,
        })
    }

    /// One bounded LLM call naming a title from the opening of the document.
    /// Failures are logged and skipped so ingest never dies on the extractor.
    async fn extract_title(&self, first_chunk: &str) -> Option<String> {
        let excerpt: String = first_chunk.chars().take(1000).collect();
        let prompt = format!(
            "Give a concise title for the following document excerpt. \
             Reply with the title only.\n\n{}",
            excerpt
        );

        match self.llm.generate(&prompt).await {
            Ok(title) => {
                let title = title.trim().trim_matches('"').to_string();
                (!title.is_empty()).then_some(title)
            }
            Err(e) => {
                warn!("title extraction failed: {}", e);
                None
            }
        }
    }
}
