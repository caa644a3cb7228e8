//! Knowledge store: seeding and claim verification

use super::embedding::{Embedder, HashingEmbedder, RemoteEmbedder};
use super::index::{ClaimIndex, LocalClaimIndex};
use super::models::{EmbedderStamp, FactCheckOutput, FactCheckStatus, IndexMatch, IndexedClaim};
use super::qdrant::QdrantClaimIndex;
use super::seed::seed_records;
use crate::config::Config;
use crate::error::{NewsSenseError, Result};
use crate::metrics::METRICS;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

/// Persistent claim collection plus the embedder used to query it.
///
/// Opened once per process and shared by every fact-check.
pub struct KnowledgeStore {
    index: Arc<dyn ClaimIndex>,
    embedder: Arc<dyn Embedder>,
    distance_threshold: f32,
    seeded: OnceCell<()>,
}

impl KnowledgeStore {
    pub fn new(
        index: Arc<dyn ClaimIndex>,
        embedder: Arc<dyn Embedder>,
        distance_threshold: f32,
    ) -> Self {
        Self {
            index,
            embedder,
            distance_threshold,
            seeded: OnceCell::new(),
        }
    }

    /// Open the configured index and embedder and seed the collection
    pub async fn open(config: &Config) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = match &config.llm.embedding_model {
            Some(model) => Arc::new(RemoteEmbedder::new(
                &config.llm,
                model.clone(),
                config.knowledge.embedding_cache_size,
            )?),
            None => Arc::new(HashingEmbedder::new(config.knowledge.hashing_dimension)),
        };

        let index: Arc<dyn ClaimIndex> = match &config.knowledge.qdrant_url {
            Some(url) => {
                // The collection's vector size has to be known up front
                let stamp = embedder_stamp(embedder.as_ref()).await?;
                Arc::new(
                    QdrantClaimIndex::connect(url, &config.knowledge.collection_name, stamp)
                        .await?,
                )
            }
            None => Arc::new(
                LocalClaimIndex::open(&config.knowledge.path, &config.knowledge.collection_name)
                    .await?,
            ),
        };

        info!(
            "Knowledge store ready (embedder: {}, threshold: {})",
            embedder.model_name(),
            config.knowledge.distance_threshold
        );

        let store = Self::new(index, embedder, config.knowledge.distance_threshold);
        store.ensure_seeded().await?;
        Ok(store)
    }

    /// Number of claims in the collection
    pub async fn count(&self) -> Result<usize> {
        self.index.count().await
    }

    /// Seed the built-in claims if the collection is empty or was embedded
    /// by a different embedder.
    ///
    /// Runs at most once per store; concurrent callers wait for the first.
    pub async fn ensure_seeded(&self) -> Result<()> {
        self.seeded.get_or_try_init(|| self.seed()).await?;
        Ok(())
    }

    async fn seed(&self) -> Result<()> {
        let current = embedder_stamp(self.embedder.as_ref()).await?;

        let existing = self.index.count().await?;
        if existing > 0 {
            match self.index.stamp().await? {
                Some(stored) if stored == current => {
                    debug!("Collection already holds {} claims, skipping seed", existing);
                    return Ok(());
                }
                Some(stored) => warn!(
                    "Collection was embedded with {}, re-embedding with {}",
                    stored, current
                ),
                None => warn!(
                    "Collection has no embedder recorded, re-embedding with {}",
                    current
                ),
            }
        }
        self.index.reset(&current).await?;

        let records = seed_records();
        let documents: Vec<String> = records.iter().map(|r| r.question_text.clone()).collect();
        let embeddings = self.embedder.embed(&documents).await?;

        let mut claims = Vec::with_capacity(records.len());
        for (record, embedding) in records.into_iter().zip(embeddings) {
            claims.push(IndexedClaim {
                metadata: record.to_metadata()?,
                id: record.id,
                document: record.question_text,
                embedding,
            });
        }

        info!("Seeding knowledge base with {} claims", claims.len());
        self.index.upsert(claims).await
    }

    /// Verify a claim against the nearest stored claim
    #[instrument(skip(self), fields(threshold = self.distance_threshold))]
    pub async fn check(&self, claim: &str) -> Result<FactCheckOutput> {
        let result = self.lookup(claim).await;
        match &result {
            Ok(output) => METRICS.record_fact_check(output.status.as_str()),
            Err(_) => METRICS.record_fact_check("error"),
        }
        result
    }

    async fn lookup(&self, claim: &str) -> Result<FactCheckOutput> {
        self.ensure_seeded().await?;

        let vector = self.embedder.embed_one(claim).await?;
        let nearest = self.index.nearest(&vector).await?;

        if let Some(hit) = &nearest {
            debug!("Nearest claim {} at distance {:.4}", hit.id, hit.distance);
        }

        decide(nearest, self.distance_threshold)
    }
}

/// Model name and vector length of `embedder`
async fn embedder_stamp(embedder: &dyn Embedder) -> Result<EmbedderStamp> {
    let probe = embedder.embed_one("dimension probe").await?;
    Ok(EmbedderStamp {
        model: embedder.model_name().to_string(),
        dimension: probe.len(),
    })
}

/// A match counts only when its distance is strictly below the threshold
pub fn decide(nearest: Option<IndexMatch>, threshold: f32) -> Result<FactCheckOutput> {
    match nearest {
        Some(hit) if hit.distance < threshold => {
            let result = hit.metadata.to_verification().map_err(|e| {
                NewsSenseError::Store(format!("claim {} has malformed sources: {}", hit.id, e))
            })?;
            Ok(FactCheckOutput {
                status: FactCheckStatus::Success,
                result,
            })
        }
        _ => Ok(FactCheckOutput::not_found()),
    }
}
