//! `search_tavily`: web search for trending headlines

use super::{required_str, Tool, ToolError};
use crate::search::WebSearch;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct SearchTavilyTool {
    search: Arc<dyn WebSearch>,
    max_results: usize,
}

impl SearchTavilyTool {
    pub fn new(search: Arc<dyn WebSearch>, max_results: usize) -> Self {
        Self {
            search,
            max_results,
        }
    }
}

#[async_trait]
impl Tool for SearchTavilyTool {
    fn name(&self) -> &'static str {
        "search_tavily"
    }

    fn description(&self) -> &'static str {
        "Search Tavily for the given query and return results."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query"
                }
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    async fn invoke(&self, input: Value) -> Result<Value, ToolError> {
        let query = required_str(&input, "query")?;

        let hits = self
            .search
            .search(query, self.max_results)
            .await
            .map_err(|e| ToolError::Upstream(e.to_string()))?;

        Ok(serde_json::to_value(hits)?)
    }
}
