use crate::types::{AppError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A tool invocable from the ReAct loop with a single text input.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn execute(&self, input: &str) -> Result<String>;
}

pub struct ToolRegistry {
    // BTreeMap keeps prompt listings in a stable order.
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Registry with the built-in tools (calculator, search, weather).
    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(crate::tools::calculator::Calculator));
        registry.register(Arc::new(crate::tools::search::SearchTool));
        registry.register(Arc::new(crate::tools::weather::WeatherTool));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// One `- name: description` line per tool, for prompt assembly.
    pub fn describe(&self) -> String {
        self.tools
            .values()
            .map(|tool| format!("- {}: {}", tool.name(), tool.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub async fn execute(&self, name: &str, input: &str) -> Result<String> {
        match self.tools.get(name) {
            Some(tool) => tool.execute(input).await,
            None => Err(AppError::NotFound(format!("Tool not found: {}", name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = ToolRegistry::with_builtin_tools();
        assert!(registry.has_tool("calculator"));
        assert!(registry.has_tool("search"));
        assert!(registry.has_tool("weather"));
        assert_eq!(registry.tool_names().len(), 3);
    }

    #[test]
    fn test_describe_lists_every_tool() {
        let registry = ToolRegistry::with_builtin_tools();
        let listing = registry.describe();
        for name in registry.tool_names() {
            assert!(listing.contains(&format!("- {}:", name)));
        }
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let registry = ToolRegistry::with_builtin_tools();
        let result = registry.execute("teleport", "home").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_execute_calculator() {
        let registry = ToolRegistry::with_builtin_tools();
        let result = registry.execute("calculator", "2 + 3 * 4").await.unwrap();
        assert_eq!(result, "14");
    }
}
