//! # skillet
//!
//! A message-bus LLM handler service. Skillet connects to a NATS broker,
//! registers labeled request handlers, and dispatches inbound requests to
//! them:
//!
//! - `chat` - personality chat over the caller's message history
//! - `memory` / `clear_memory` - chat over process-held conversation memory
//! - `react` - bounded tool-calling loop (calculator, search, weather)
//! - `query` - retrieval-augmented answers from the vector store
//! - `storage` - document ingestion (chunk, embed, index) and deletion
//! - `embed` - inline text embedding into the store
//!
//! The heavy lifting is delegated: completions go to an LLM provider
//! (OpenAI or Ollama), embeddings to the embeddings API, and similarity
//! search to the vector store. Skillet's own job is assembling prompts,
//! shaping responses, and accounting token usage through a shared counter
//! that resets after every request.
//!
//! ## Library usage
//!
//! ```rust,ignore
//! use skillet::{AppState, HandlerRegistry, BusClient, Settings};
//! use std::sync::Arc;
//!
//! let settings = Settings::load(None)?;
//! let state = AppState::from_settings(settings)?;
//! let registry = Arc::new(HandlerRegistry::with_default_handlers(&state));
//!
//! let bus = BusClient::connect(&state.settings.bus, registry).await?;
//! bus.run().await?;
//! ```

/// Shared application state and handler registry.
pub mod app;
/// NATS client loop and subject routing.
pub mod bus;
/// Vector store backends.
pub mod db;
/// Text embedding clients.
pub mod embedding;
/// Request handlers (chat, memory, react, query, storage, embed).
pub mod handlers;
/// LLM provider clients and abstractions.
pub mod llm;
/// Conversation memory strategies.
pub mod memory;
/// Chunking and the document ingest pipeline.
pub mod rag;
/// ReAct action parsing and prompt assembly.
pub mod react;
/// Tool table for the ReAct handler.
pub mod tools;
/// Request/response schemas, token accounting, and errors.
pub mod types;
/// Configuration and token counting utilities.
pub mod utils;

pub use app::{AppState, HandlerRegistry};
pub use bus::BusClient;
pub use db::{LocalVectorStore, VectorStore};
pub use embedding::Embedder;
pub use llm::{LlmClient, Provider};
pub use memory::{MemoryKind, MemoryManager};
pub use tools::ToolRegistry;
pub use types::{AppError, Result};
pub use utils::config::Settings;
pub use utils::token_counter::TokenCounter;
