//! `fact_check_claim`: verify a claim against the knowledge base

use super::{required_str, Tool, ToolError};
use crate::knowledge::KnowledgeStore;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct FactCheckClaimTool {
    store: Arc<KnowledgeStore>,
}

impl FactCheckClaimTool {
    pub fn new(store: Arc<KnowledgeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for FactCheckClaimTool {
    fn name(&self) -> &'static str {
        "fact_check_claim"
    }

    fn description(&self) -> &'static str {
        "Verify a claim against the local knowledge base and return its verdict, summary and sources."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "claim": {
                    "type": "string",
                    "description": "The claim to verify"
                }
            },
            "required": ["claim"],
            "additionalProperties": false
        })
    }

    async fn invoke(&self, input: Value) -> Result<Value, ToolError> {
        let claim = required_str(&input, "claim")?;

        let output = self
            .store
            .check(claim)
            .await
            .map_err(|e| ToolError::Upstream(e.to_string()))?;

        Ok(serde_json::to_value(output)?)
    }
}
