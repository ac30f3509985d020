//! Shared application state and the handler registry.

use crate::db::{LocalVectorStore, VectorStore};
use crate::embedding::{CountingEmbedder, Embedder, HashEmbedder, OpenAiEmbedder};
use crate::handlers::{
    ChatHandler, ClearMemoryHandler, DocumentStorageHandler, EmbedHandler, MemoryChatHandler,
    QueryHandler, RagQueryHandler, ReactHandler, StorageHandler, TextEmbedHandler,
};
use crate::llm::{CountingLlm, LlmClient, Provider};
use crate::memory::MemoryManager;
use crate::rag::{Chunker, IngestPipeline};
use crate::tools::ToolRegistry;
use crate::types::Result;
use crate::utils::config::Settings;
use crate::utils::token_counter::TokenCounter;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Process-wide resources shared by every handler: the LLM client and
/// embedder (both wrapped for token accounting), the vector store, the
/// conversation memory, and the tool table.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub llm: Arc<dyn LlmClient>,
    pub embedder: Arc<dyn Embedder>,
    pub store: Arc<dyn VectorStore>,
    pub counter: Arc<TokenCounter>,
    pub memory: Arc<Mutex<MemoryManager>>,
    pub tools: Arc<ToolRegistry>,
    pub pipeline: Arc<IngestPipeline>,
}

impl AppState {
    /// Wire up state from pre-built clients. The LLM client and embedder are
    /// wrapped with the shared token counter here, so callers pass the bare
    /// provider clients.
    pub fn from_parts(
        settings: Settings,
        llm: Box<dyn LlmClient>,
        embedder: Box<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let counter = Arc::new(TokenCounter::new());
        let llm: Arc<dyn LlmClient> = Arc::new(CountingLlm::new(llm, counter.clone()));
        let embedder: Arc<dyn Embedder> =
            Arc::new(CountingEmbedder::new(embedder, counter.clone()));

        let memory = MemoryManager::new(settings.memory.kind, settings.memory.window);
        let tools = Arc::new(ToolRegistry::with_builtin_tools());

        let chunker = Chunker::new(settings.ingest.chunk_size, settings.ingest.chunk_overlap)?;
        let pipeline = Arc::new(IngestPipeline::new(
            chunker,
            embedder.clone(),
            store.clone(),
            llm.clone(),
            settings.ingest.extract_titles,
        ));

        Ok(Self {
            settings: Arc::new(settings),
            llm,
            embedder,
            store,
            counter,
            memory: Arc::new(Mutex::new(memory)),
            tools,
            pipeline,
        })
    }

    /// Build state with the providers named in settings.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let provider = Provider::from_settings(&settings)?;
        info!(provider = provider.name(), model = %settings.llm.model, "llm configured");
        let llm = provider.create_client()?;

        let embedder: Box<dyn Embedder> = match settings.embedding_api_key() {
            Some(api_key) => Box::new(OpenAiEmbedder::new(
                api_key.to_string(),
                settings.embedding.model.clone(),
                settings.embedding.dimensions,
            )),
            None => {
                warn!("no embedding API key configured, falling back to local hash embedder");
                Box::new(HashEmbedder::new(settings.embedding.dimensions))
            }
        };

        let store: Arc<dyn VectorStore> =
            Arc::new(LocalVectorStore::from_config(&settings.vector_store)?);
        info!(backend = store.provider_name(), "vector store ready");

        Self::from_parts(settings, llm, embedder, store)
    }
}

/// Maps request labels to handlers, per request class.
#[derive(Default)]
pub struct HandlerRegistry {
    query: HashMap<String, Arc<dyn QueryHandler>>,
    storage: HashMap<String, Arc<dyn StorageHandler>>,
    embed: HashMap<String, Arc<dyn EmbedHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in handler bound to its label.
    pub fn with_default_handlers(state: &AppState) -> Self {
        let mut registry = Self::new();
        registry.register_query("chat", Arc::new(ChatHandler::new(state.clone())));
        registry.register_query("memory", Arc::new(MemoryChatHandler::new(state.clone())));
        registry.register_query(
            "clear_memory",
            Arc::new(ClearMemoryHandler::new(state.clone())),
        );
        registry.register_query("react", Arc::new(ReactHandler::new(state.clone())));
        registry.register_query("query", Arc::new(RagQueryHandler::new(state.clone())));
        registry.register_storage("storage", Arc::new(DocumentStorageHandler::new(state.clone())));
        registry.register_embed("embed", Arc::new(TextEmbedHandler::new(state.clone())));
        registry
    }

    pub fn register_query(&mut self, label: &str, handler: Arc<dyn QueryHandler>) {
        if self.query.insert(label.to_string(), handler).is_some() {
            warn!(label, "replacing existing query handler");
        }
    }

    pub fn register_storage(&mut self, label: &str, handler: Arc<dyn StorageHandler>) {
        if self.storage.insert(label.to_string(), handler).is_some() {
            warn!(label, "replacing existing storage handler");
        }
    }

    pub fn register_embed(&mut self, label: &str, handler: Arc<dyn EmbedHandler>) {
        if self.embed.insert(label.to_string(), handler).is_some() {
            warn!(label, "replacing existing embed handler");
        }
    }

    pub fn query_handler(&self, label: &str) -> Option<&Arc<dyn QueryHandler>> {
        self.query.get(label)
    }

    pub fn storage_handler(&self, label: &str) -> Option<&Arc<dyn StorageHandler>> {
        self.storage.get(label)
    }

    pub fn embed_handler(&self, label: &str) -> Option<&Arc<dyn EmbedHandler>> {
        self.embed.get(label)
    }

    pub fn query_labels(&self) -> Vec<String> {
        self.query.keys().cloned().collect()
    }
}
