//! Structured outputs of the specialist agents

use crate::knowledge::FactCheckOutput;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A single, ranked news headline with its source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsHeadline {
    /// 1 is the most trending
    pub rank: i64,
    pub headline: String,
    /// Source URL of the article
    pub source: String,
}

/// Trending headlines for one topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingNews {
    pub topic: String,
    pub headlines: Vec<NewsHeadline>,
}

/// Output of the article summarizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizeOutput {
    pub summary_text: String,
}

/// Final answer of a dispatch, tagged by the specialist that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "output", rename_all = "snake_case")]
pub enum AgentOutput {
    TrendingNews(TrendingNews),
    FactCheck(FactCheckOutput),
    Summary(SummarizeOutput),
    /// Free text that matched no known shape
    Unrecognized(String),
}

impl AgentOutput {
    pub fn kind(&self) -> &'static str {
        match self {
            AgentOutput::TrendingNews(_) => "trending_news",
            AgentOutput::FactCheck(_) => "fact_check",
            AgentOutput::Summary(_) => "summary",
            AgentOutput::Unrecognized(_) => "unrecognized",
        }
    }

    /// Classify free text once, when no specialist produced the answer.
    ///
    /// A JSON object is tried as trending news (`headlines`), then as a fact
    /// check (`result`), then as a summary (`summary_text`).
    pub fn probe(text: &str) -> Self {
        let Ok(Value::Object(object)) = serde_json::from_str::<Value>(strip_code_fence(text))
        else {
            return AgentOutput::Unrecognized(text.to_string());
        };
        let value = Value::Object(object);

        if value.get("headlines").is_some() {
            if let Ok(news) = serde_json::from_value(value.clone()) {
                return AgentOutput::TrendingNews(news);
            }
        }
        if value.get("result").is_some() {
            if let Ok(check) = serde_json::from_value(value.clone()) {
                return AgentOutput::FactCheck(check);
            }
        }
        if value.get("summary_text").is_some() {
            if let Ok(summary) = serde_json::from_value(value) {
                return AgentOutput::Summary(summary);
            }
        }

        AgentOutput::Unrecognized(text.to_string())
    }
}

/// Which structured output a specialist must return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    TrendingNews,
    FactCheck,
    Summary,
}

impl OutputKind {
    /// Schema name sent in `response_format`
    pub fn schema_name(&self) -> &'static str {
        match self {
            OutputKind::TrendingNews => "TrendingNews",
            OutputKind::FactCheck => "FactCheckOutput",
            OutputKind::Summary => "SummarizeOutput",
        }
    }

    pub fn schema(&self) -> Value {
        match self {
            OutputKind::TrendingNews => json!({
                "type": "object",
                "description": "A collection of trending news headlines for a specific topic.",
                "properties": {
                    "topic": {
                        "type": "string",
                        "description": "The central topic these headlines relate to."
                    },
                    "headlines": {
                        "type": "array",
                        "description": "A list of ranked, trending headlines about the topic.",
                        "items": {
                            "type": "object",
                            "properties": {
                                "rank": {
                                    "type": "integer",
                                    "description": "The rank of the headline based on its trend frequency (1 is the most trending)."
                                },
                                "headline": {
                                    "type": "string",
                                    "description": "The concise news headline."
                                },
                                "source": {
                                    "type": "string",
                                    "description": "The source URL for the news article."
                                }
                            },
                            "required": ["rank", "headline", "source"],
                            "additionalProperties": false
                        }
                    }
                },
                "required": ["topic", "headlines"],
                "additionalProperties": false
            }),
            OutputKind::FactCheck => json!({
                "type": "object",
                "properties": {
                    "status": {
                        "type": "string",
                        "enum": ["success", "info"]
                    },
                    "result": {
                        "type": "object",
                        "properties": {
                            "verdict": {"type": "string"},
                            "summary": {"type": "string"},
                            "sources": {
                                "type": "array",
                                "items": {"type": "string"}
                            }
                        },
                        "required": ["verdict", "summary", "sources"],
                        "additionalProperties": false
                    }
                },
                "required": ["status", "result"],
                "additionalProperties": false
            }),
            OutputKind::Summary => json!({
                "type": "object",
                "properties": {
                    "summary_text": {
                        "type": "string",
                        "description": "Summarized text from a given article."
                    }
                },
                "required": ["summary_text"],
                "additionalProperties": false
            }),
        }
    }

    /// Parse a specialist's final content into its output type
    pub fn parse(&self, content: &str) -> Result<AgentOutput, serde_json::Error> {
        let body = strip_code_fence(content);
        Ok(match self {
            OutputKind::TrendingNews => AgentOutput::TrendingNews(from_body(body)?),
            OutputKind::FactCheck => AgentOutput::FactCheck(from_body(body)?),
            OutputKind::Summary => AgentOutput::Summary(from_body(body)?),
        })
    }
}

fn from_body<T: DeserializeOwned>(body: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(body)
}

/// Drop a surrounding markdown code fence (```json ... ```), if any
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Skip the info string (e.g. `json`) on the opening line
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}
