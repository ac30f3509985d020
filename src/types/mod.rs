//! Core types: bus request/response schemas, token accounting, and errors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form metadata attached to requests, responses, and indexed chunks.
pub type Metadata = serde_json::Map<String, Value>;

// ============= Chat Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

// ============= Token Accounting =============

/// Token usage accumulated while serving a single request.
///
/// A field is `None` when the corresponding stage never ran (e.g. no
/// embedding call during a plain chat request).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    pub embedding_tokens: Option<usize>,
    pub llm_prompt_tokens: Option<usize>,
    pub llm_completion_tokens: Option<usize>,
    pub total_llm_tokens: Option<usize>,
}

impl TokenCounts {
    pub fn is_empty(&self) -> bool {
        self.embedding_tokens.is_none()
            && self.llm_prompt_tokens.is_none()
            && self.llm_completion_tokens.is_none()
    }

    /// Render as a JSON object for merging into response metadata.
    pub fn to_metadata(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

// ============= Query Schemas =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            label: label.into(),
            metadata: None,
            stream: false,
            stream_id: None,
            messages: None,
        }
    }
}

/// A chunk returned from the vector store as supporting context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub metadata: Metadata,
    pub score: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval_context: Option<Vec<RetrievedChunk>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub token_counts: TokenCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
}

impl QueryResponse {
    /// Error-shaped response: the failure is stringified into `output` and
    /// the caller's metadata and history are echoed back unchanged.
    pub fn from_error(request: &QueryRequest, err: &AppError) -> Self {
        Self {
            input: Some(request.query.clone()),
            output: Some(format!("Error: {}", err)),
            retrieval_context: None,
            metadata: request.metadata.clone(),
            token_counts: TokenCounts::default(),
            messages: request.messages.clone(),
        }
    }
}

// ============= Storage Schemas =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageStatus {
    Pending,
    Running,
    Complete,
    Error,
    Ack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageRequest {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub data: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageResponse {
    pub id: i64,
    pub status: StorageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub token_counts: TokenCounts,
}

impl StorageResponse {
    pub fn complete(id: i64, metadata: Metadata, token_counts: TokenCounts) -> Self {
        Self {
            id,
            status: StorageStatus::Complete,
            error: None,
            metadata: Some(metadata),
            token_counts,
        }
    }

    pub fn error(id: i64, err: &AppError) -> Self {
        Self {
            id,
            status: StorageStatus::Error,
            error: Some(err.to_string()),
            metadata: None,
            token_counts: TokenCounts::default(),
        }
    }
}

// ============= Embed Schemas =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    #[serde(default)]
    pub label: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub token_counts: TokenCounts,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Bus error: {0}")]
    Bus(String),

    #[error("Ingest error: {0}")]
    Ingest(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_round_trip() {
        let json = r#"{"query":"What is RAG?","label":"query","metadata":{"source":"docs"}}"#;
        let req: QueryRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.query, "What is RAG?");
        assert_eq!(req.label, "query");
        assert!(!req.stream);
        assert_eq!(
            req.metadata.unwrap().get("source").unwrap(),
            &Value::String("docs".into())
        );
    }

    #[test]
    fn test_error_response_echoes_request() {
        let mut req = QueryRequest::new("hello", "chat");
        req.messages = Some(vec![ChatMessage::user("hello")]);

        let resp = QueryResponse::from_error(&req, &AppError::Llm("connection refused".into()));
        assert_eq!(resp.input.as_deref(), Some("hello"));
        assert!(resp.output.unwrap().starts_with("Error: "));
        assert_eq!(resp.messages.unwrap().len(), 1);
        assert!(resp.token_counts.is_empty());
    }

    #[test]
    fn test_storage_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&StorageStatus::Complete).unwrap(),
            "\"complete\""
        );
    }

    #[test]
    fn test_token_counts_metadata_shape() {
        let counts = TokenCounts {
            llm_prompt_tokens: Some(12),
            llm_completion_tokens: Some(3),
            total_llm_tokens: Some(15),
            embedding_tokens: None,
        };
        let value = counts.to_metadata();
        assert_eq!(value["llm_prompt_tokens"], 12);
        assert_eq!(value["embedding_tokens"], Value::Null);
    }
}
