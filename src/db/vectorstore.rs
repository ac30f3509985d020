//! Vector store abstraction and the embedded local backend.
//!
//! The store holds embedded chunks keyed by id, grouped under the document
//! they came from. Search is cosine similarity with optional metadata
//! equality filters: a chunk matches when every filter key is present in its
//! metadata with exactly the filter's value.

use crate::types::{AppError, Metadata, Result, RetrievedChunk};
use crate::utils::config::VectorStoreConfig;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// An embedded chunk as stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique chunk id.
    pub id: String,
    /// Id of the document this chunk belongs to; deletes operate on this.
    pub doc_id: String,
    pub text: String,
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

/// Abstract trait for vector store backends.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend name for logging.
    fn provider_name(&self) -> &'static str;

    /// Insert or replace chunks by id. Returns the number written.
    async fn upsert(&self, chunks: &[ChunkRecord]) -> Result<usize>;

    /// Cosine-similarity search with metadata equality filters.
    ///
    /// Results are sorted by score descending, truncated to `top_k`, and
    /// exclude anything below `min_score`.
    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        min_score: f32,
        filters: &Metadata,
    ) -> Result<Vec<RetrievedChunk>>;

    /// Delete every chunk belonging to a document. Returns the number removed.
    async fn delete_document(&self, doc_id: &str) -> Result<usize>;

    /// Number of chunks in the store.
    async fn count(&self) -> Result<usize>;
}

// ============= Embedded Local Store =============

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    chunks: HashMap<String, ChunkRecord>,
}

/// Embedded vector store with optional JSON persistence.
///
/// With a path, the full index is written back after every mutation and
/// reloaded on open; without one the index lives in memory only.
pub struct LocalVectorStore {
    state: RwLock<StoreState>,
    path: Option<PathBuf>,
}

impl LocalVectorStore {
    /// In-memory store.
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            path: None,
        }
    }

    /// Open (or create) a persistent store under `dir`, one file per
    /// collection.
    pub fn open(dir: impl Into<PathBuf>, collection: &str) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            AppError::VectorStore(format!("Failed to create store directory: {}", e))
        })?;
        let path = dir.join(format!("{}.json", collection));

        let state = if path.exists() {
            let json = std::fs::read_to_string(&path)
                .map_err(|e| AppError::VectorStore(format!("Failed to read index: {}", e)))?;
            serde_json::from_str(&json)
                .map_err(|e| AppError::VectorStore(format!("Failed to parse index: {}", e)))?
        } else {
            StoreState::default()
        };

        Ok(Self {
            state: RwLock::new(state),
            path: Some(path),
        })
    }

    /// Open from settings: path set ⇒ persistent, otherwise in-memory.
    pub fn from_config(config: &VectorStoreConfig) -> Result<Self> {
        match &config.path {
            Some(dir) => Self::open(dir.clone(), &config.collection),
            None => Ok(Self::in_memory()),
        }
    }

    fn persist(&self, state: &StoreState) -> Result<()> {
        if let Some(path) = &self.path {
            let json = serde_json::to_string(state)
                .map_err(|e| AppError::VectorStore(format!("Failed to serialize index: {}", e)))?;
            std::fs::write(path, json)
                .map_err(|e| AppError::VectorStore(format!("Failed to write index: {}", e)))?;
        }
        Ok(())
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }

    fn matches_filters(metadata: &Metadata, filters: &Metadata) -> bool {
        filters
            .iter()
            .all(|(key, value)| metadata.get(key) == Some(value))
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    fn provider_name(&self) -> &'static str {
        if self.path.is_some() { "local" } else { "in-memory" }
    }

    async fn upsert(&self, chunks: &[ChunkRecord]) -> Result<usize> {
        for chunk in chunks {
            if chunk.embedding.is_empty() {
                return Err(AppError::InvalidInput(format!(
                    "Chunk '{}' is missing an embedding",
                    chunk.id
                )));
            }
        }

        let mut state = self.state.write();
        for chunk in chunks {
            state.chunks.insert(chunk.id.clone(), chunk.clone());
        }
        self.persist(&state)?;
        Ok(chunks.len())
    }

    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        min_score: f32,
        filters: &Metadata,
    ) -> Result<Vec<RetrievedChunk>> {
        let state = self.state.read();

        let mut results: Vec<RetrievedChunk> = state
            .chunks
            .values()
            .filter(|chunk| Self::matches_filters(&chunk.metadata, filters))
            .filter_map(|chunk| {
                let score = Self::cosine_similarity(embedding, &chunk.embedding);
                (score >= min_score).then(|| RetrievedChunk {
                    text: chunk.text.clone(),
                    metadata: chunk.metadata.clone(),
                    score,
                })
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);

        Ok(results)
    }

    async fn delete_document(&self, doc_id: &str) -> Result<usize> {
        let mut state = self.state.write();
        let before = state.chunks.len();
        state.chunks.retain(|_, chunk| chunk.doc_id != doc_id);
        let removed = before - state.chunks.len();
        if removed > 0 {
            self.persist(&state)?;
        }
        Ok(removed)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.state.read().chunks.len())
    }
}
