//! Storage backends.

pub mod vectorstore;

pub use vectorstore::{ChunkRecord, LocalVectorStore, VectorStore};
