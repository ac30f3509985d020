use crate::llm::client::LlmClient;
use crate::types::{AppError, ChatMessage as BusMessage, MessageRole, Result};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, request::ChatMessageRequest},
};

pub struct OllamaClient {
    client: Ollama,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Self {
        // Accept "http://host:port", "host:port", or bare "host".
        let url_parts: Vec<&str> = base_url.split("://").collect();
        let (host, port) = if url_parts.len() == 2 {
            let host_port: Vec<&str> = url_parts[1].split(':').collect();
            let host = host_port[0].to_string();
            let port = if host_port.len() == 2 {
                host_port[1].parse().unwrap_or(11434)
            } else {
                11434
            };
            (host, port)
        } else {
            ("localhost".to_string(), 11434)
        };

        Self {
            client: Ollama::new(host, port),
            model,
        }
    }

    fn to_ollama_messages(messages: &[BusMessage]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|msg| match msg.role {
                MessageRole::System => ChatMessage::system(msg.content.clone()),
                MessageRole::User => ChatMessage::user(msg.content.clone()),
                MessageRole::Assistant => ChatMessage::assistant(msg.content.clone()),
            })
            .collect()
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = ChatMessageRequest::new(self.model.clone(), messages);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::Llm(format!("Ollama error: {}", e)))?;

        Ok(response.message.content)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.complete(vec![ChatMessage::user(prompt.to_string())])
            .await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.complete(vec![
            ChatMessage::system(system.to_string()),
            ChatMessage::user(prompt.to_string()),
        ])
        .await
    }

    async fn chat(&self, messages: &[BusMessage]) -> Result<String> {
        self.complete(Self::to_ollama_messages(messages)).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
