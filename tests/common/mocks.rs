//! Mock implementations shared across test files.

use async_trait::async_trait;
use parking_lot::Mutex;
use skillet::llm::LlmClient;
use skillet::types::{AppError, ChatMessage, Result};
use std::collections::VecDeque;

/// Scripted LLM client: returns its replies in order, repeating the last one
/// once the script runs out. `failing()` always errors.
pub struct MockLlm {
    replies: Mutex<VecDeque<String>>,
    last: Mutex<String>,
    should_fail: bool,
}

impl MockLlm {
    pub fn new(reply: &str) -> Self {
        Self::scripted(vec![reply])
    }

    pub fn scripted(replies: Vec<&str>) -> Self {
        let last = replies.last().map(|s| s.to_string()).unwrap_or_default();
        Self {
            replies: Mutex::new(replies.into_iter().map(String::from).collect()),
            last: Mutex::new(last),
            should_fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            last: Mutex::new(String::new()),
            should_fail: true,
        }
    }

    fn next_reply(&self) -> Result<String> {
        if self.should_fail {
            return Err(AppError::Llm("Mock LLM failure".to_string()));
        }
        let mut replies = self.replies.lock();
        match replies.pop_front() {
            Some(reply) => {
                *self.last.lock() = reply.clone();
                Ok(reply)
            }
            None => Ok(self.last.lock().clone()),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.next_reply()
    }

    async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
        self.next_reply()
    }

    async fn chat(&self, _messages: &[ChatMessage]) -> Result<String> {
        self.next_reply()
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
