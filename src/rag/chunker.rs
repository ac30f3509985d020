use crate::types::{AppError, Result};
use text_splitter::{ChunkConfig, TextSplitter};

/// Splits document text into overlapping chunks for embedding.
pub struct Chunker {
    splitter: TextSplitter<text_splitter::Characters>,
    chunk_size: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        // The splitter rejects overlap >= capacity.
        let overlap = chunk_overlap.min(chunk_size.saturating_sub(1));
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(overlap)
            .map_err(|e| AppError::Ingest(format!("Invalid chunk configuration: {}", e)))?;

        Ok(Self {
            splitter: TextSplitter::new(config),
            chunk_size,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.splitter
            .chunks(text)
            .filter(|c| !c.trim().is_empty())
            .collect()
    }
}
