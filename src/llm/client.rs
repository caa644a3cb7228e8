//! Chat completion client for OpenAI-compatible endpoints

use super::types::{ChatMessage, ChatRequest, ChatResponse};
use crate::config::LlmConfig;
use crate::metrics::METRICS;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, warn};

/// Anything that can answer a chat completion request
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send the request and return the first choice's message
    async fn complete(&self, request: &ChatRequest) -> Result<ChatMessage, LlmError>;
}

/// Chat client errors
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No choices in response")]
    EmptyResponse,
}

impl LlmError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::ApiError { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            LlmError::NetworkError(_) => true,
            _ => false,
        }
    }
}

/// Chat client over the OpenAI `/chat/completions` wire format
pub struct OpenAiChatClient {
    http: Client,
    url: String,
    api_key: SecretString,
    max_retries: usize,
    retry_backoff: Duration,
}

impl OpenAiChatClient {
    /// Create a client for the configured endpoint
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LlmError::InitializationError(e.to_string()))?;

        Ok(Self {
            http,
            url: config.chat_completions_url(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff(),
        })
    }

    /// Exponential backoff before the given retry (1-based)
    fn calculate_backoff(&self, retry: usize) -> Duration {
        let multiplier = 2_u32.saturating_pow(retry.saturating_sub(1) as u32);
        self.retry_backoff.saturating_mul(multiplier)
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<ChatMessage, LlmError> {
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatMessage, LlmError> {
        debug!(
            "Chat completion: model={}, messages={}, tools={}",
            request.model,
            request.messages.len(),
            request.tools.len()
        );

        let mut attempt = 0;
        loop {
            match self.send_once(request).await {
                Ok(message) => {
                    METRICS.record_llm_request(true);
                    return Ok(message);
                }
                Err(e) => {
                    METRICS.record_llm_request(false);

                    if !e.is_retryable() || attempt >= self.max_retries {
                        warn!("Chat completion failed after {} attempts: {}", attempt + 1, e);
                        return Err(e);
                    }

                    attempt += 1;
                    let backoff = self.calculate_backoff(attempt);
                    warn!(
                        "Chat completion attempt {} failed: {}, retrying in {:?}",
                        attempt, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}
