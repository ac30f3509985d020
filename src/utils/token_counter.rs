//! Shared token usage accumulator.
//!
//! One counter instance is shared (via `Arc`) between the LLM client wrapper,
//! the embedder wrapper, and the handlers. Counts accumulate across all
//! delegated calls made while serving a request; the handler finishes by
//! calling [`TokenCounter::take`], which snapshots and resets so usage never
//! leaks into the next request.

use crate::types::TokenCounts;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tiktoken_rs::CoreBPE;

static TOKENIZER: LazyLock<CoreBPE> = LazyLock::new(|| {
    tiktoken_rs::cl100k_base().expect("failed to initialize cl100k_base tokenizer")
});

/// Count tokens in a piece of text with the shared `cl100k_base` encoding.
pub fn count_tokens(text: &str) -> usize {
    TOKENIZER.encode_with_special_tokens(text).len()
}

#[derive(Debug, Default)]
pub struct TokenCounter {
    prompt: AtomicUsize,
    completion: AtomicUsize,
    embedding: AtomicUsize,
    llm_used: AtomicBool,
    embedding_used: AtomicBool,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_prompt(&self, text: &str) {
        self.add_prompt(count_tokens(text));
    }

    pub fn record_completion(&self, text: &str) {
        self.add_completion(count_tokens(text));
    }

    pub fn record_embedding(&self, text: &str) {
        self.add_embedding(count_tokens(text));
    }

    pub fn add_prompt(&self, tokens: usize) {
        self.prompt.fetch_add(tokens, Ordering::Relaxed);
        self.llm_used.store(true, Ordering::Relaxed);
    }

    pub fn add_completion(&self, tokens: usize) {
        self.completion.fetch_add(tokens, Ordering::Relaxed);
        self.llm_used.store(true, Ordering::Relaxed);
    }

    pub fn add_embedding(&self, tokens: usize) {
        self.embedding.fetch_add(tokens, Ordering::Relaxed);
        self.embedding_used.store(true, Ordering::Relaxed);
    }

    /// Current totals without resetting.
    pub fn snapshot(&self) -> TokenCounts {
        let prompt = self.prompt.load(Ordering::Relaxed);
        let completion = self.completion.load(Ordering::Relaxed);
        let embedding = self.embedding.load(Ordering::Relaxed);
        let llm_used = self.llm_used.load(Ordering::Relaxed);
        let embedding_used = self.embedding_used.load(Ordering::Relaxed);

        TokenCounts {
            embedding_tokens: embedding_used.then_some(embedding),
            llm_prompt_tokens: llm_used.then_some(prompt),
            llm_completion_tokens: llm_used.then_some(completion),
            total_llm_tokens: llm_used.then_some(prompt + completion),
        }
    }

    /// Snapshot the totals and reset the counter for the next request.
    pub fn take(&self) -> TokenCounts {
        let counts = self.snapshot();
        self.prompt.store(0, Ordering::Relaxed);
        self.completion.store(0, Ordering::Relaxed);
        self.embedding.store(0, Ordering::Relaxed);
        self.llm_used.store(false, Ordering::Relaxed);
        self.embedding_used.store(false, Ordering::Relaxed);
        counts
    }
}
