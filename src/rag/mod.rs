//! Retrieval-augmented generation components: chunking and the ingest
//! pipeline. Retrieval itself lives behind [`crate::db::VectorStore`]; answer
//! generation behind [`crate::llm::LlmClient`].

pub mod chunker;
pub mod pipeline;

pub use chunker::Chunker;
pub use pipeline::{IngestPipeline, IngestReport};
