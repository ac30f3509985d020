//! ReAct tool-calling chat: a bounded loop where each model reply is scanned
//! for an `Action:` / `Input:` directive. Known tools are executed and their
//! results fed back; any other reply ends the loop as the final answer.

use crate::app::AppState;
use crate::handlers::{QueryHandler, response_metadata};
use crate::react::{ToolUse, build_system_prompt, parse_action};
use crate::types::{ChatMessage, QueryRequest, QueryResponse, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

pub struct ReactHandler {
    state: AppState,
}

impl ReactHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    async fn run(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let mut messages = request.messages.clone().unwrap_or_default();

        if messages.is_empty() {
            messages.push(ChatMessage::system(build_system_prompt(
                &self.state.settings.chat.system_prompt,
                &self.state.tools,
            )));
        }

        messages.push(ChatMessage::user(request.query.clone()));

        let max_steps = self.state.settings.react.max_steps;
        let mut tool_usage: Vec<ToolUse> = Vec::new();
        let mut output = String::new();

        for step in 0..max_steps {
            output = self.state.llm.chat(&messages).await?;

            let action = parse_action(&output)
                .filter(|call| self.state.tools.has_tool(&call.tool));

            match action {
                Some(call) => {
                    // A failing tool reports its error as the observation
                    // instead of killing the whole request.
                    let result = match self.state.tools.execute(&call.tool, &call.input).await {
                        Ok(result) => result,
                        Err(e) => format!("Error: {}", e),
                    };
                    debug!(step, tool = %call.tool, "executed tool");

                    tool_usage.push(ToolUse {
                        tool: call.tool,
                        input: call.input,
                        output: result.clone(),
                    });

                    messages.push(ChatMessage::assistant(output.clone()));
                    messages.push(ChatMessage::system(format!("Tool result: {}", result)));
                }
                None => {
                    messages.push(ChatMessage::assistant(output.clone()));
                    break;
                }
            }
        }

        let token_counts = self.state.counter.take();
        let metadata = response_metadata(
            &token_counts,
            vec![("tool_usage", json!(tool_usage))],
            request.metadata.as_ref(),
        );

        Ok(QueryResponse {
            input: Some(request.query.clone()),
            output: Some(output),
            retrieval_context: None,
            metadata: Some(metadata),
            token_counts,
            messages: Some(messages),
        })
    }
}

#[async_trait]
impl QueryHandler for ReactHandler {
    async fn handle(&self, request: QueryRequest) -> QueryResponse {
        match self.run(&request).await {
            Ok(response) => response,
            Err(e) => {
                debug!("react handler failed: {}", e);
                self.state.counter.take();
                QueryResponse::from_error(&request, &e)
            }
        }
    }
}
