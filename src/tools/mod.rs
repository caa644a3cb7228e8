//! Function tools exposed to the specialist agents

use crate::llm::ToolDefinition;
use crate::metrics::METRICS;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

pub mod fact_check;
pub mod search;
pub mod summarize;

pub use fact_check::FactCheckClaimTool;
pub use search::SearchTavilyTool;
pub use summarize::SummarizeNewsTool;

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A function the model can call
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must be unique)
    fn name(&self) -> &'static str;

    /// Tool description shown to the model
    fn description(&self) -> &'static str;

    /// JSON schema of the arguments object
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with parsed arguments
    async fn invoke(&self, input: Value) -> Result<Value, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(self.name(), self.description(), self.parameters_schema())
    }
}

/// Read a required, non-blank string argument
pub(crate) fn required_str<'a>(input: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    let value = input
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::Invalid(format!("missing string argument '{}'", key)))?;

    if value.trim().is_empty() {
        return Err(ToolError::Invalid(format!("argument '{}' is empty", key)));
    }
    Ok(value)
}

/// Tool registry for one agent, in registration order
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn list(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Definitions to advertise in a chat request
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Run a tool call from the model; `arguments` is the raw JSON string
    pub async fn execute(&self, name: &str, arguments: &str) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        let input: Value = if arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(arguments)?
        };

        debug!("Invoking tool {} with {}", name, input);

        let result = crate::time_operation!(METRICS.tool_duration, name, tool.invoke(input).await);

        METRICS.record_tool_call(name, result.is_ok());
        if let Err(e) = &result {
            warn!("Tool {} failed: {}", name, e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Echo the input"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }

        async fn invoke(&self, input: Value) -> Result<Value, ToolError> {
            Ok(Value::String(required_str(&input, "text")?.to_string()))
        }
    }

    #[test]
    fn test_tool_registry() {
        let registry = ToolRegistry::new().with(Arc::new(EchoTool));

        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.list(), vec!["echo"]);

        let definitions = registry.definitions();
        assert_eq!(definitions[0].function.name, "echo");
    }

    #[tokio::test]
    async fn test_execute_parses_arguments() {
        let registry = ToolRegistry::new().with(Arc::new(EchoTool));

        let result = registry.execute("echo", r#"{"text":"hello"}"#).await.unwrap();
        assert_eq!(result, json!("hello"));
    }

    #[tokio::test]
    async fn test_execute_errors() {
        let registry = ToolRegistry::new().with(Arc::new(EchoTool));

        assert!(matches!(
            registry.execute("missing", "{}").await,
            Err(ToolError::NotFound(_))
        ));
        assert!(matches!(
            registry.execute("echo", "not json").await,
            Err(ToolError::Json(_))
        ));
        assert!(matches!(
            registry.execute("echo", r#"{"text":"  "}"#).await,
            Err(ToolError::Invalid(_))
        ));
    }
}
