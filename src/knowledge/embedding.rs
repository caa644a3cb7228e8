//! Text embedders for claim similarity search

use crate::config::LlmConfig;
use crate::error::{NewsSenseError, Result};
use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

/// Turns text into fixed-length vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier of the embedding model, for logs
    fn model_name(&self) -> &str;

    /// Embed a batch of texts, one vector per input in order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| NewsSenseError::Embedding("embedder returned no vectors".to_string()))
    }
}

/// Cosine distance `1 - cos(a, b)`, clamped to `[0, 2]`.
///
/// Zero vectors are treated as unrelated to everything (distance 1).
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    (1.0 - similarity).clamp(0.0, 2.0)
}

/// Offline embedder: signed feature hashing of lowercase word tokens.
///
/// Deterministic, so identical text always maps to the identical vector.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in Self::tokens(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        "feature-hashing"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// Embedder over an OpenAI-compatible `/embeddings` endpoint, with a cache
pub struct RemoteEmbedder {
    http: Client,
    url: String,
    api_key: SecretString,
    model: String,
    cache: Cache<String, Arc<Vec<f32>>>,
}

impl RemoteEmbedder {
    pub fn new(config: &LlmConfig, model: impl Into<String>, cache_size: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| NewsSenseError::Embedding(e.to_string()))?;

        Ok(Self {
            http,
            url: config.embeddings_url(),
            api_key: config.api_key.clone(),
            model: model.into(),
            cache: Cache::new(cache_size),
        })
    }

    async fn fetch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| NewsSenseError::Embedding(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NewsSenseError::Embedding(format!("HTTP {}: {}", status, body)));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| NewsSenseError::Embedding(format!("Failed to parse response: {}", e)))?;

        if parsed.data.len() != texts.len() {
            return Err(NewsSenseError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut misses = Vec::new();

        for text in texts {
            match self.cache.get(text).await {
                Some(cached) => vectors.push(Some(cached.as_ref().clone())),
                None => {
                    vectors.push(None);
                    misses.push(text.clone());
                }
            }
        }

        debug!(
            "Embedding cache: {} hits, {} misses",
            texts.len() - misses.len(),
            misses.len()
        );

        if !misses.is_empty() {
            let fetched = self.fetch(&misses).await?;
            let mut fetched = fetched.into_iter();

            for (slot, text) in vectors.iter_mut().zip(texts) {
                if slot.is_none() {
                    let vector = fetched.next().ok_or_else(|| {
                        NewsSenseError::Embedding("embedding batch came back short".to_string())
                    })?;
                    self.cache.insert(text.clone(), Arc::new(vector.clone())).await;
                    *slot = Some(vector);
                }
            }
        }

        vectors
            .into_iter()
            .map(|v| v.ok_or_else(|| NewsSenseError::Embedding("missing embedding".to_string())))
            .collect()
    }
}
