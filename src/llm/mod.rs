//! LLM access over the OpenAI-compatible chat completions API

pub mod client;
pub mod types;

pub use client::{ChatClient, LlmError, OpenAiChatClient};
pub use types::{
    ChatMessage, ChatRequest, FunctionCall, JsonSchemaSpec, ResponseFormat, Role, ToolCall,
    ToolDefinition,
};

#[cfg(test)]
pub(crate) mod testing;
