//! Application settings loaded from a YAML file and environment overrides.
//!
//! Lookup order when no explicit path is given: `./skillet.yaml`,
//! `~/.config/skillet/skillet.yaml`, `/etc/skillet/skillet.yaml`. Environment
//! variables prefixed with `SKILLET_` override file values
//! (`SKILLET_BUS__URL`, `SKILLET_LLM__API_KEY`, ...).

use crate::types::{AppError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub react: ReactConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusConfig {
    #[serde(default = "default_bus_url")]
    pub url: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Falls back to `llm.api_key` when unset.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorStoreConfig {
    /// Directory for the persisted index; `None` keeps everything in memory.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_collection")]
    pub collection: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_personality")]
    pub personality: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub kind: crate::memory::MemoryKind,
    /// Exchanges kept verbatim by the window strategy.
    #[serde(default = "default_memory_window")]
    pub window: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReactConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub min_score: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// When set, one LLM call per ingested document names a title that is
    /// stored in chunk metadata.
    #[serde(default)]
    pub extract_titles: bool,
}

fn default_bus_url() -> String {
    "nats://127.0.0.1:4222".to_string()
}

fn default_client_id() -> String {
    "skillet".to_string()
}

fn default_namespace() -> String {
    "skillet".to_string()
}

fn default_llm_provider() -> String {
    "openai".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_dimensions() -> usize {
    1536
}

fn default_collection() -> String {
    "default".to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful assistant.".to_string()
}

fn default_personality() -> String {
    "assistant".to_string()
}

fn default_memory_window() -> usize {
    5
}

fn default_max_steps() -> usize {
    5
}

fn default_top_k() -> usize {
    4
}

fn default_chunk_size() -> usize {
    1024
}

fn default_chunk_overlap() -> usize {
    128
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            vector_store: VectorStoreConfig::default(),
            chat: ChatConfig::default(),
            memory: MemoryConfig::default(),
            react: ReactConfig::default(),
            retrieval: RetrievalConfig::default(),
            ingest: IngestConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            url: default_bus_url(),
            client_id: default_client_id(),
            user: None,
            password: None,
            namespace: default_namespace(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            api_key: None,
            api_base: default_api_base(),
            ollama_url: default_ollama_url(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            api_key: None,
            dimensions: default_dimensions(),
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            collection: default_collection(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            personality: default_personality(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            kind: Default::default(),
            window: default_memory_window(),
        }
    }
}

impl Default for ReactConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: 0.0,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            extract_titles: false,
        }
    }
}

impl Settings {
    /// Load settings from the given file, or the first file found in the
    /// standard locations. Missing files are fine: defaults plus environment
    /// overrides still produce a usable configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();

        match path {
            Some(explicit) => {
                builder = builder.add_source(config::File::from(explicit));
            }
            None => {
                if let Some(found) = Self::find_config_file() {
                    builder = builder.add_source(config::File::from(found.as_path()));
                }
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SKILLET")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    fn find_config_file() -> Option<PathBuf> {
        let mut candidates = vec![PathBuf::from("skillet.yaml")];
        if let Some(home) = std::env::var_os("HOME") {
            candidates.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("skillet")
                    .join("skillet.yaml"),
            );
        }
        candidates.push(PathBuf::from("/etc/skillet/skillet.yaml"));
        candidates.into_iter().find(|p| p.exists())
    }

    /// API key for the embeddings endpoint, falling back to the LLM key.
    pub fn embedding_api_key(&self) -> Option<&str> {
        self.embedding
            .api_key
            .as_deref()
            .or(self.llm.api_key.as_deref())
    }
}
