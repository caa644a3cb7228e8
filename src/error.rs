//! Crate-wide error type

use crate::config::ConfigError;
use crate::llm::LlmError;
use crate::search::SearchError;

/// Errors raised while building or running the news sense assistant
#[derive(Debug, thiserror::Error)]
pub enum NewsSenseError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Knowledge store error: {0}")]
    Store(String),

    #[error("Agent run exceeded {0} turns without a final answer")]
    MaxTurnsExceeded(usize),

    #[error("Output of {agent} did not match its schema: {message}")]
    OutputValidation { agent: String, message: String },

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NewsSenseError>;
