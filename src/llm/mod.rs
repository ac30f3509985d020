//! LLM provider clients and abstractions.

pub mod client;
/// Token-counting client decorator.
pub mod counting;
pub mod ollama;
pub mod openai;

pub use client::{LlmClient, Provider};
pub use counting::CountingLlm;
