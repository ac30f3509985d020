//! Token-counting decorator around an [`LlmClient`].
//!
//! Every prompt sent and completion received is measured with the shared
//! tokenizer and added to the [`TokenCounter`] the service hands out to its
//! handlers. This is wired once at startup, so handlers get accounting for
//! free no matter which provider backs the client.

use crate::llm::client::LlmClient;
use crate::types::{ChatMessage, Result};
use crate::utils::token_counter::TokenCounter;
use async_trait::async_trait;
use std::sync::Arc;

pub struct CountingLlm {
    inner: Box<dyn LlmClient>,
    counter: Arc<TokenCounter>,
}

impl CountingLlm {
    pub fn new(inner: Box<dyn LlmClient>, counter: Arc<TokenCounter>) -> Self {
        Self { inner, counter }
    }
}

#[async_trait]
impl LlmClient for CountingLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.counter.record_prompt(prompt);
        let output = self.inner.generate(prompt).await?;
        self.counter.record_completion(&output);
        Ok(output)
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.counter.record_prompt(system);
        self.counter.record_prompt(prompt);
        let output = self.inner.generate_with_system(system, prompt).await?;
        self.counter.record_completion(&output);
        Ok(output)
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        for message in messages {
            self.counter.record_prompt(&message.content);
        }
        let output = self.inner.chat(messages).await?;
        self.counter.record_completion(&output);
        Ok(output)
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AppError;

    struct FixedLlm(&'static str);

    #[async_trait]
    impl LlmClient for FixedLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
        async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
        async fn chat(&self, _messages: &[ChatMessage]) -> Result<String> {
            Ok(self.0.to_string())
        }
        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(AppError::Llm("boom".into()))
        }
        async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
            Err(AppError::Llm("boom".into()))
        }
        async fn chat(&self, _messages: &[ChatMessage]) -> Result<String> {
            Err(AppError::Llm("boom".into()))
        }
        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_counts_prompt_and_completion() {
        let counter = Arc::new(TokenCounter::new());
        let llm = CountingLlm::new(Box::new(FixedLlm("Paris.")), counter.clone());

        llm.chat(&[
            ChatMessage::system("You are a helpful assistant."),
            ChatMessage::user("What is the capital of France?"),
        ])
        .await
        .unwrap();

        let counts = counter.take();
        assert!(counts.llm_prompt_tokens.unwrap() > 0);
        assert!(counts.llm_completion_tokens.unwrap() > 0);
    }

    #[tokio::test]
    async fn test_failed_call_still_counts_prompt() {
        let counter = Arc::new(TokenCounter::new());
        let llm = CountingLlm::new(Box::new(FailingLlm), counter.clone());

        assert!(llm.generate("hello there").await.is_err());

        let counts = counter.take();
        assert!(counts.llm_prompt_tokens.unwrap() > 0);
        assert_eq!(counts.llm_completion_tokens, Some(0));
    }
}
