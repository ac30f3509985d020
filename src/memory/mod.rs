//! Conversation memory for the memory-chat handler.
//!
//! Three strategies, selected in settings:
//! - `buffer`: the full transcript.
//! - `window`: only the most recent `k` exchanges.
//! - `summary`: a running summary (maintained by the LLM) ahead of the most
//!   recent exchanges.
//!
//! One conversation is kept per process.

use crate::llm::LlmClient;
use crate::types::{ChatMessage, MessageRole, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    #[default]
    Buffer,
    Window,
    Summary,
}

impl MemoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Buffer => "buffer",
            MemoryKind::Window => "window",
            MemoryKind::Summary => "summary",
        }
    }
}

pub struct MemoryManager {
    kind: MemoryKind,
    /// Exchanges (user + assistant pairs) kept verbatim.
    window: usize,
    messages: VecDeque<ChatMessage>,
    summary: Option<String>,
}

impl MemoryManager {
    pub fn new(kind: MemoryKind, window: usize) -> Self {
        Self {
            kind,
            window: window.max(1),
            messages: VecDeque::new(),
            summary: None,
        }
    }

    pub fn kind(&self) -> MemoryKind {
        self.kind
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push_back(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push_back(ChatMessage::assistant(content));
    }

    /// The remembered conversation, shaped per strategy.
    pub fn history(&self) -> Vec<ChatMessage> {
        match self.kind {
            MemoryKind::Buffer => self.messages.iter().cloned().collect(),
            MemoryKind::Window => self.recent(self.window * 2),
            MemoryKind::Summary => {
                let mut history = Vec::new();
                if let Some(summary) = &self.summary {
                    history.push(ChatMessage::system(format!(
                        "Summary of the conversation so far: {}",
                        summary
                    )));
                }
                history.extend(self.recent(self.window * 2));
                history
            }
        }
    }

    fn recent(&self, n: usize) -> Vec<ChatMessage> {
        let skip = self.messages.len().saturating_sub(n);
        self.messages.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.history().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.summary.is_none()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.summary = None;
    }

    /// Whether the transcript has outgrown the verbatim window and should be
    /// folded into the running summary.
    pub fn needs_condensing(&self) -> bool {
        self.kind == MemoryKind::Summary && self.messages.len() > self.window * 2
    }

    /// Fold everything older than the verbatim window into the summary.
    ///
    /// Summarization is delegated to the LLM; on failure the transcript is
    /// left untouched so nothing is lost.
    pub async fn condense(&mut self, llm: &dyn LlmClient) -> Result<()> {
        if !self.needs_condensing() {
            return Ok(());
        }

        let keep_from = self.messages.len() - self.window * 2;
        let older: Vec<ChatMessage> = self.messages.iter().take(keep_from).cloned().collect();

        let transcript = older
            .iter()
            .map(|m| {
                let speaker = match m.role {
                    MessageRole::User => "User",
                    MessageRole::Assistant => "Assistant",
                    MessageRole::System => "System",
                };
                format!("{}: {}", speaker, m.content)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = match &self.summary {
            Some(existing) => format!(
                "Current summary of a conversation:\n{}\n\nNew lines to fold in:\n{}\n\n\
                 Write an updated summary. Reply with the summary only.",
                existing, transcript
            ),
            None => format!(
                "Summarize the following conversation in a few sentences. \
                 Reply with the summary only.\n\n{}",
                transcript
            ),
        };

        let summary = llm.generate(&prompt).await?;
        self.summary = Some(summary.trim().to_string());
        self.messages.drain(..keep_from);
        Ok(())
    }
}
