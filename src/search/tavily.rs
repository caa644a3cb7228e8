//! Tavily web search client

use super::{SearchError, SearchHit, WebSearch};
use crate::config::SearchConfig;
use crate::metrics::METRICS;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Client for the Tavily `/search` endpoint
pub struct TavilyClient {
    http: Client,
    endpoint: String,
    api_key: SecretString,
}

#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    #[serde(default)]
    score: f64,
}

impl TavilyClient {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.tavily_api_key.clone(),
        })
    }

    async fn call_search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let url = format!("{}/search", self.endpoint);

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&TavilySearchRequest { query, max_results })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout(e.to_string())
                } else {
                    SearchError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SearchError::UpstreamError(format!(
                "Status {}: {}",
                status, error_text
            )));
        }

        let body: TavilySearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        Ok(body
            .results
            .into_iter()
            .map(|item| SearchHit {
                rank: item.score,
                source: item.url,
                headline: item.title,
            })
            .collect())
    }
}

#[async_trait]
impl WebSearch for TavilyClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::InvalidQuery("query is empty".to_string()));
        }

        debug!("Tavily search: query={}, max_results={}", query, max_results);

        let result = self.call_search(query, max_results).await;
        METRICS.record_search(result.is_ok());

        if let Ok(hits) = &result {
            info!("Tavily returned {} results", hits.len());
        }
        result
    }
}
