//! Scripted chat client for unit tests

use super::client::{ChatClient, LlmError};
use super::types::{ChatMessage, ChatRequest, ToolCall};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Replays canned replies and records every request
pub struct ScriptedClient {
    pub replies: Mutex<VecDeque<ChatMessage>>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<ChatMessage>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatMessage, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::EmptyResponse)
    }
}

/// Assistant turn calling one function
pub fn call(id: &str, name: &str, args: &str) -> ChatMessage {
    ChatMessage::assistant_tool_calls(None, vec![ToolCall::new(id, name, args)])
}
