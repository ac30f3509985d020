use crate::tools::registry::Tool;
use crate::types::Result;
use async_trait::async_trait;

/// Placeholder search tool: echoes the query. Swap in a real backend by
/// registering a different implementation under the same name.
pub struct SearchTool;

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search for information on the internet"
    }

    async fn execute(&self, input: &str) -> Result<String> {
        Ok(format!("Search results for: {}", input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_echoes_query() {
        let result = SearchTool.execute("rust programming").await.unwrap();
        assert_eq!(result, "Search results for: rust programming");
    }
}
