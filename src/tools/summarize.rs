//! `summarize_news`: validates the article and hands it back to the model

use super::{required_str, Tool, ToolError};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

#[derive(Default)]
pub struct SummarizeNewsTool;

#[async_trait]
impl Tool for SummarizeNewsTool {
    fn name(&self) -> &'static str {
        "summarize_news"
    }

    fn description(&self) -> &'static str {
        "Take the user article and validate it."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "article_text": {
                    "type": "string",
                    "description": "The full text of the news article to be summarized."
                }
            },
            "required": ["article_text"],
            "additionalProperties": false
        })
    }

    async fn invoke(&self, input: Value) -> Result<Value, ToolError> {
        let article_text = required_str(&input, "article_text")?;
        info!("Summarizing article ({} chars)", article_text.len());
        Ok(Value::String(article_text.to_string()))
    }
}
