//! Claim index backed by Qdrant

use super::index::ClaimIndex;
use super::models::{ClaimMetadata, EmbedderStamp, IndexMatch, IndexedClaim};
use crate::error::{NewsSenseError, Result};
use async_trait::async_trait;
use qdrant_client::{
    client::{Payload, QdrantClient},
    qdrant::{
        value::Kind, vectors_config, CountPoints, CreateCollection, Distance, PointStruct,
        ScrollPoints, SearchPoints, Value, VectorParams, VectorsConfig,
    },
};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, info};

/// Claim index stored in a Qdrant collection with cosine distance.
///
/// Qdrant point ids must be integers or UUIDs, so the fixed claim id is kept
/// in the `record_id` payload field and the point id is derived from it.
/// Every point also carries the `embedder` that produced its vector.
pub struct QdrantClaimIndex {
    client: QdrantClient,
    collection_name: String,
    embedder: EmbedderStamp,
}

impl QdrantClaimIndex {
    /// Connect and make sure the collection exists
    pub async fn connect(
        url: &str,
        collection_name: &str,
        embedder: EmbedderStamp,
    ) -> Result<Self> {
        let client = QdrantClient::from_url(url)
            .build()
            .map_err(|e| NewsSenseError::Store(format!("Failed to create Qdrant client: {}", e)))?;

        let index = Self {
            client,
            collection_name: collection_name.to_string(),
            embedder,
        };
        index.ensure_collection().await?;
        Ok(index)
    }

    async fn vector_size(&self) -> Result<Option<usize>> {
        let info = self
            .client
            .collection_info(&self.collection_name)
            .await
            .map_err(|e| NewsSenseError::Store(format!("Failed to read collection info: {}", e)))?;

        let config = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config);

        Ok(match config {
            Some(vectors_config::Config::Params(params)) => Some(params.size as usize),
            _ => None,
        })
    }

    async fn first_point_embedder(&self) -> Result<Option<String>> {
        let response = self
            .client
            .scroll(&ScrollPoints {
                collection_name: self.collection_name.clone(),
                limit: Some(1),
                with_payload: Some(true.into()),
                ..Default::default()
            })
            .await
            .map_err(|e| NewsSenseError::Store(format!("Failed to scroll claims: {}", e)))?;

        Ok(response
            .result
            .first()
            .and_then(|point| string_field(&point.payload, "embedder")))
    }

    async fn ensure_collection(&self) -> Result<()> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| NewsSenseError::Store(format!("Failed to list collections: {}", e)))?;

        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection_name);

        if !exists {
            self.create_collection().await?;
        }

        Ok(())
    }

    async fn create_collection(&self) -> Result<()> {
        info!(
            "Creating Qdrant collection {} for {}",
            self.collection_name, self.embedder
        );

        self.client
            .create_collection(&CreateCollection {
                collection_name: self.collection_name.clone(),
                vectors_config: Some(VectorsConfig {
                    config: Some(vectors_config::Config::Params(VectorParams {
                        size: self.embedder.dimension as u64,
                        distance: Distance::Cosine.into(),
                        ..Default::default()
                    })),
                }),
                ..Default::default()
            })
            .await
            .map_err(|e| NewsSenseError::Store(format!("Failed to create collection: {}", e)))?;

        Ok(())
    }
}

/// Numeric point id for a claim id: `id_7` -> 7, anything else hashed
pub(crate) fn point_id_for(record_id: &str) -> u64 {
    if let Some(n) = record_id.strip_prefix("id_").and_then(|n| n.parse().ok()) {
        return n;
    }
    let digest = Sha256::digest(record_id.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

fn string_field(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
    match payload.get(key)?.kind.as_ref()? {
        Kind::StringValue(s) => Some(s.clone()),
        _ => None,
    }
}

#[async_trait]
impl ClaimIndex for QdrantClaimIndex {
    async fn count(&self) -> Result<usize> {
        let response = self
            .client
            .count(&CountPoints {
                collection_name: self.collection_name.clone(),
                exact: Some(true),
                ..Default::default()
            })
            .await
            .map_err(|e| NewsSenseError::Store(format!("Failed to count points: {}", e)))?;

        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }

    async fn upsert(&self, claims: Vec<IndexedClaim>) -> Result<()> {
        let mut points = Vec::with_capacity(claims.len());
        for claim in claims {
            let mut fields = serde_json::Map::new();
            fields.insert("record_id".to_string(), claim.id.clone().into());
            fields.insert("document".to_string(), claim.document.into());
            fields.insert("verdict".to_string(), claim.metadata.verdict.into());
            fields.insert("summary".to_string(), claim.metadata.summary.into());
            fields.insert("sources".to_string(), claim.metadata.sources.into());
            fields.insert("embedder".to_string(), self.embedder.model.clone().into());

            let payload = Payload::try_from(serde_json::Value::Object(fields))
                .map_err(|e| NewsSenseError::Store(format!("Invalid claim payload: {}", e)))?;

            points.push(PointStruct::new(
                point_id_for(&claim.id),
                claim.embedding,
                payload,
            ));
        }

        debug!("Upserting {} claims into {}", points.len(), self.collection_name);

        self.client
            .upsert_points(&self.collection_name, None, points, None)
            .await
            .map_err(|e| NewsSenseError::Store(format!("Failed to upsert claims: {}", e)))?;

        Ok(())
    }

    async fn nearest(&self, vector: &[f32]) -> Result<Option<IndexMatch>> {
        let response = self
            .client
            .search_points(&SearchPoints {
                collection_name: self.collection_name.clone(),
                vector: vector.to_vec(),
                limit: 1,
                with_payload: Some(true.into()),
                ..Default::default()
            })
            .await
            .map_err(|e| NewsSenseError::Store(format!("Failed to search claims: {}", e)))?;

        let Some(point) = response.result.into_iter().next() else {
            return Ok(None);
        };

        let payload = &point.payload;
        let field = |key: &str| {
            string_field(payload, key)
                .ok_or_else(|| NewsSenseError::Store(format!("claim payload is missing {}", key)))
        };

        Ok(Some(IndexMatch {
            id: field("record_id")?,
            document: field("document")?,
            metadata: ClaimMetadata {
                verdict: field("verdict")?,
                summary: field("summary")?,
                sources: field("sources")?,
            },
            // Qdrant reports cosine similarity
            distance: (1.0 - point.score).clamp(0.0, 2.0),
        }))
    }

    async fn stamp(&self) -> Result<Option<EmbedderStamp>> {
        let Some(dimension) = self.vector_size().await? else {
            return Ok(None);
        };
        let model = self
            .first_point_embedder()
            .await?
            .unwrap_or_else(|| "unknown".to_string());
        Ok(Some(EmbedderStamp { model, dimension }))
    }

    async fn reset(&self, stamp: &EmbedderStamp) -> Result<()> {
        if *stamp != self.embedder {
            return Err(NewsSenseError::Store(format!(
                "index was opened for {} but asked to reset for {}",
                self.embedder, stamp
            )));
        }

        self.client
            .delete_collection(&self.collection_name)
            .await
            .map_err(|e| NewsSenseError::Store(format!("Failed to drop collection: {}", e)))?;
        self.create_collection().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_id_for_fixed_ids() {
        assert_eq!(point_id_for("id_1"), 1);
        assert_eq!(point_id_for("id_42"), 42);
        assert_eq!(point_id_for("custom"), point_id_for("custom"));
        assert_ne!(point_id_for("custom"), point_id_for("other"));
    }

    // Note: requires a running Qdrant instance

    #[tokio::test]
    #[ignore]
    async fn test_qdrant_index_roundtrip() {
        let stamp = EmbedderStamp {
            model: "feature-hashing".to_string(),
            dimension: 2,
        };
        let index =
            QdrantClaimIndex::connect("http://localhost:6334", "news_sense_test", stamp.clone())
                .await
                .unwrap();
        index.reset(&stamp).await.unwrap();
        index
            .upsert(vec![IndexedClaim {
                id: "id_1".to_string(),
                document: "did apple acquire openai?".to_string(),
                embedding: vec![1.0, 0.0],
                metadata: ClaimMetadata {
                    verdict: "False.".to_string(),
                    summary: "s".to_string(),
                    sources: "[]".to_string(),
                },
            }])
            .await
            .unwrap();

        let hit = index.nearest(&[1.0, 0.0]).await.unwrap().unwrap();
        assert_eq!(hit.id, "id_1");
        assert!(hit.distance < 1e-3);
        assert_eq!(index.stamp().await.unwrap(), Some(stamp));
    }
}
