//! ReAct tool-calling support: action parsing and prompt assembly.
//!
//! The model is instructed to reply with a `Thought:` / `Action:` / `Input:`
//! block when it wants a tool. Replies are scanned for that directive; a
//! reply without one (or naming an unknown tool) is the final answer.

use crate::tools::ToolRegistry;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static ACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Action: (\w+)\nInput: (.+)").expect("valid action regex"));

/// A tool invocation parsed out of model output.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionCall {
    pub tool: String,
    pub input: String,
}

/// One executed tool call, reported in response metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolUse {
    pub tool: String,
    pub input: String,
    pub output: String,
}

/// Scan model output for an `Action:` / `Input:` directive.
pub fn parse_action(text: &str) -> Option<ActionCall> {
    ACTION_RE.captures(text).map(|caps| ActionCall {
        tool: caps[1].to_string(),
        input: caps[2].trim().to_string(),
    })
}

/// Assemble the tool-calling system prompt from the configured base prompt
/// and the registry's tool listing.
pub fn build_system_prompt(base: &str, tools: &ToolRegistry) -> String {
    format!(
        "{}\n\n\
         Available tools:\n{}\n\n\
         To use a tool, respond with:\n\
         Thought: what you're thinking\n\
         Action: tool_name\n\
         Input: tool input\n\n\
         After using a tool, I'll show you the result and you can continue thinking.",
        base,
        tools.describe()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_block() {
        let text = "Thought: I should calculate this\nAction: calculator\nInput: 2 + 2";
        let call = parse_action(text).unwrap();
        assert_eq!(call.tool, "calculator");
        assert_eq!(call.input, "2 + 2");
    }

    #[test]
    fn test_parse_trims_input() {
        let call = parse_action("Action: search\nInput:   rust nats client  ").unwrap();
        assert_eq!(call.input, "rust nats client");
    }

    #[test]
    fn test_plain_answer_has_no_action() {
        assert!(parse_action("The capital of France is Paris.").is_none());
    }

    #[test]
    fn test_action_requires_input_line() {
        assert!(parse_action("Action: calculator").is_none());
    }

    #[test]
    fn test_system_prompt_lists_tools() {
        let registry = ToolRegistry::with_builtin_tools();
        let prompt = build_system_prompt("You are a helpful assistant.", &registry);

        assert!(prompt.starts_with("You are a helpful assistant."));
        assert!(prompt.contains("- calculator:"));
        assert!(prompt.contains("Action: tool_name"));
    }
}
