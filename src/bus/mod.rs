//! NATS client loop: subscribes to the service namespace, routes inbound
//! requests to registered handlers by label, and publishes JSON replies.
//!
//! Subjects:
//! - `{namespace}.query.{label}` - chat / memory / react / rag requests
//! - `{namespace}.storage.{label}` - document ingestion
//! - `{namespace}.storage.{label}.delete` - document deletion
//! - `{namespace}.embed.{label}` - text embedding
//!
//! Malformed payloads and unknown labels answer with an error-shaped reply;
//! the loop itself never dies on a bad message.

use crate::app::HandlerRegistry;
use crate::types::{
    AppError, EmbedRequest, QueryRequest, QueryResponse, Result, StorageRequest, StorageResponse,
    StorageStatus, TokenCounts,
};
use crate::utils::config::BusConfig;
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// A parsed request subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Query(String),
    Storage(String),
    StorageDelete(String),
    Embed(String),
}

/// Parse `{namespace}.{class}.{label}[.delete]` into a route.
pub fn parse_subject(namespace: &str, subject: &str) -> Option<Route> {
    let rest = subject.strip_prefix(namespace)?.strip_prefix('.')?;
    let segments: Vec<&str> = rest.split('.').collect();

    match segments.as_slice() {
        ["query", label] => Some(Route::Query((*label).to_string())),
        ["storage", label] => Some(Route::Storage((*label).to_string())),
        ["storage", label, "delete"] => Some(Route::StorageDelete((*label).to_string())),
        ["embed", label] => Some(Route::Embed((*label).to_string())),
        _ => None,
    }
}

fn error_reply(message: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({ "error": message })).unwrap_or_else(|_| Vec::new())
}

/// Dispatch one request payload to its handler and produce the reply bytes.
pub async fn dispatch(registry: &HandlerRegistry, route: Route, payload: &[u8]) -> Vec<u8> {
    match route {
        Route::Query(label) => {
            let request: QueryRequest = match serde_json::from_slice(payload) {
                Ok(request) => request,
                Err(e) => {
                    let response = QueryResponse {
                        output: Some(format!("Error: Invalid query payload: {}", e)),
                        token_counts: TokenCounts::default(),
                        ..Default::default()
                    };
                    return serde_json::to_vec(&response).unwrap_or_default();
                }
            };

            let response = match registry.query_handler(&label) {
                Some(handler) => handler.handle(request).await,
                None => QueryResponse::from_error(
                    &request,
                    &AppError::NotFound(format!("No query handler for label '{}'", label)),
                ),
            };
            serde_json::to_vec(&response).unwrap_or_default()
        }

        Route::Storage(label) => {
            let request: StorageRequest = match serde_json::from_slice(payload) {
                Ok(request) => request,
                Err(e) => return error_reply(&format!("Invalid storage payload: {}", e)),
            };

            let response = match registry.storage_handler(&label) {
                Some(handler) => handler.handle(request).await,
                None => StorageResponse::error(
                    request.id,
                    &AppError::NotFound(format!("No storage handler for label '{}'", label)),
                ),
            };
            serde_json::to_vec(&response).unwrap_or_default()
        }

        Route::StorageDelete(label) => {
            let request: StorageRequest = match serde_json::from_slice(payload) {
                Ok(request) => request,
                Err(e) => return error_reply(&format!("Invalid storage payload: {}", e)),
            };
            let id = request.id;

            let result = match registry.storage_handler(&label) {
                Some(handler) => handler.handle_delete(request).await,
                None => Err(AppError::NotFound(format!(
                    "No storage handler for label '{}'",
                    label
                ))),
            };

            let response = match result {
                Ok(()) => StorageResponse {
                    id,
                    status: StorageStatus::Ack,
                    error: None,
                    metadata: None,
                    token_counts: TokenCounts::default(),
                },
                Err(e) => StorageResponse::error(id, &e),
            };
            serde_json::to_vec(&response).unwrap_or_default()
        }

        Route::Embed(label) => {
            let request: EmbedRequest = match serde_json::from_slice(payload) {
                Ok(request) => request,
                Err(e) => return error_reply(&format!("Invalid embed payload: {}", e)),
            };

            let result = match registry.embed_handler(&label) {
                Some(handler) => handler.handle(request).await,
                None => Err(AppError::NotFound(format!(
                    "No embed handler for label '{}'",
                    label
                ))),
            };

            match result {
                Ok(response) => serde_json::to_vec(&response).unwrap_or_default(),
                Err(e) => error_reply(&e.to_string()),
            }
        }
    }
}

/// The message-bus client: one subscription over the whole namespace,
/// dispatching each request on its own task.
pub struct BusClient {
    client: async_nats::Client,
    namespace: String,
    registry: Arc<HandlerRegistry>,
}

impl BusClient {
    pub async fn connect(config: &BusConfig, registry: Arc<HandlerRegistry>) -> Result<Self> {
        let mut options = async_nats::ConnectOptions::new().name(&config.client_id);
        if let (Some(user), Some(password)) = (&config.user, &config.password) {
            options = options.user_and_password(user.clone(), password.clone());
        }

        let client = options
            .connect(config.url.as_str())
            .await
            .map_err(|e| AppError::Bus(format!("Failed to connect to {}: {}", config.url, e)))?;
        info!(url = %config.url, client_id = %config.client_id, "connected to bus");

        Ok(Self {
            client,
            namespace: config.namespace.clone(),
            registry,
        })
    }

    /// Serve requests until ctrl-c.
    pub async fn run(&self) -> Result<()> {
        let subject = format!("{}.>", self.namespace);
        let mut subscription = self
            .client
            .subscribe(subject.clone())
            .await
            .map_err(|e| AppError::Bus(format!("Failed to subscribe to '{}': {}", subject, e)))?;
        info!(subject = %subject, "listening for requests");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("shutting down gracefully...");
                    break;
                }
                message = subscription.next() => {
                    let Some(message) = message else {
                        warn!("bus subscription closed");
                        break;
                    };
                    self.handle_message(message);
                }
            }
        }

        self.client
            .flush()
            .await
            .map_err(|e| AppError::Bus(format!("Failed to flush on shutdown: {}", e)))?;
        Ok(())
    }

    fn handle_message(&self, message: async_nats::Message) {
        let Some(route) = parse_subject(&self.namespace, message.subject.as_str()) else {
            debug!(subject = message.subject.as_str(), "ignoring unroutable subject");
            return;
        };

        let registry = self.registry.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            let subject = message.subject.clone();
            debug!(subject = subject.as_str(), "dispatching request");
            let reply_bytes = dispatch(&registry, route, &message.payload).await;

            if let Some(reply) = message.reply {
                if let Err(e) = client.publish(reply, reply_bytes.into()).await {
                    error!(subject = subject.as_str(), "failed to publish reply: {}", e);
                }
            }
        });
    }
}
