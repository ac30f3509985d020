//! LLM client abstraction and provider selection.
//!
//! Providers implement [`LlmClient`] so handlers can stay agnostic about
//! where completions come from. [`Provider`] carries the per-provider
//! connection settings and acts as the client factory.

use crate::types::{AppError, ChatMessage, Result};
use crate::utils::config::Settings;
use async_trait::async_trait;

/// Generic chat-completion client.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion from a bare prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate with a system prompt ahead of the user prompt.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Generate from a full conversation.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Model identifier used for this client.
    fn model_name(&self) -> &str;
}

/// Provider configuration for runtime selection.
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API (or any compatible endpoint via `api_base`).
    OpenAi {
        api_key: String,
        api_base: String,
        model: String,
    },
    /// Ollama local inference server.
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Build a provider from the `[llm]` settings section.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        match settings.llm.provider.as_str() {
            "openai" => {
                let api_key = settings.llm.api_key.clone().ok_or_else(|| {
                    AppError::Config(
                        "llm.api_key (or SKILLET_LLM__API_KEY) is required for the openai provider"
                            .to_string(),
                    )
                })?;
                Ok(Provider::OpenAi {
                    api_key,
                    api_base: settings.llm.api_base.clone(),
                    model: settings.llm.model.clone(),
                })
            }
            "ollama" => Ok(Provider::Ollama {
                base_url: settings.llm.ollama_url.clone(),
                model: settings.llm.model.clone(),
            }),
            other => Err(AppError::Config(format!(
                "Unknown llm provider '{}'. Use: openai, ollama",
                other
            ))),
        }
    }

    /// Create a client instance for this provider.
    pub fn create_client(&self) -> Result<Box<dyn LlmClient>> {
        match self {
            Provider::OpenAi {
                api_key,
                api_base,
                model,
            } => Ok(Box::new(super::openai::OpenAiClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
            ))),
            Provider::Ollama { base_url, model } => Ok(Box::new(super::ollama::OllamaClient::new(
                base_url.clone(),
                model.clone(),
            ))),
        }
    }

    /// Human-readable provider name.
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }
}
