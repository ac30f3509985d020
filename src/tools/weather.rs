use crate::tools::registry::Tool;
use crate::types::Result;
use async_trait::async_trait;

/// Placeholder weather tool with a canned report.
pub struct WeatherTool;

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Get weather information for a location"
    }

    async fn execute(&self, input: &str) -> Result<String> {
        Ok(format!("Weather for {}: Sunny, 72°F", input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_weather_report() {
        let result = WeatherTool.execute("Paris").await.unwrap();
        assert!(result.starts_with("Weather for Paris:"));
    }
}
