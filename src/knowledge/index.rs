//! Claim vector indexes

use super::embedding::cosine_distance;
use super::models::{EmbedderStamp, IndexMatch, IndexedClaim};
use crate::error::{NewsSenseError, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// A collection of claim embeddings searchable by cosine distance
#[async_trait]
pub trait ClaimIndex: Send + Sync {
    /// Number of stored claims
    async fn count(&self) -> Result<usize>;

    /// Insert or overwrite claims by id
    async fn upsert(&self, claims: Vec<IndexedClaim>) -> Result<()>;

    /// The single nearest claim to `vector`, if any
    async fn nearest(&self, vector: &[f32]) -> Result<Option<IndexMatch>>;

    /// Embedder recorded for the stored vectors, if any
    async fn stamp(&self) -> Result<Option<EmbedderStamp>>;

    /// Drop every stored claim and record `stamp` for what follows
    async fn reset(&self, stamp: &EmbedderStamp) -> Result<()>;
}

/// On-disk layout of a local collection
#[derive(Debug, Default, Serialize, Deserialize)]
struct CollectionFile {
    name: String,
    distance: String,
    #[serde(default)]
    embedder: Option<EmbedderStamp>,
    points: Vec<IndexedClaim>,
}

#[derive(Default)]
struct Collection {
    embedder: Option<EmbedderStamp>,
    points: IndexMap<String, IndexedClaim>,
}

/// Embedded, file-persisted claim index.
///
/// The whole collection lives in memory; every upsert rewrites
/// `<dir>/<collection>.json` through a temp file and rename.
pub struct LocalClaimIndex {
    name: String,
    file_path: PathBuf,
    collection: RwLock<Collection>,
}

impl LocalClaimIndex {
    /// Open (or create) the collection under `dir`
    pub async fn open(dir: impl AsRef<Path>, collection_name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;

        let file_path = dir.join(format!("{}.json", collection_name));
        let collection = match tokio::fs::read(&file_path).await {
            Ok(bytes) => {
                let file: CollectionFile = serde_json::from_slice(&bytes)?;
                info!(
                    "Opened collection {} with {} claims",
                    collection_name,
                    file.points.len()
                );
                Collection {
                    embedder: file.embedder,
                    points: file
                        .points
                        .into_iter()
                        .map(|p| (p.id.clone(), p))
                        .collect(),
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Creating collection: {}", collection_name);
                Collection::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            name: collection_name.to_string(),
            file_path,
            collection: RwLock::new(collection),
        })
    }

    async fn persist(&self, collection: &Collection) -> Result<()> {
        let file = CollectionFile {
            name: self.name.clone(),
            distance: "cosine".to_string(),
            embedder: collection.embedder.clone(),
            points: collection.points.values().cloned().collect(),
        };
        let bytes = serde_json::to_vec_pretty(&file)?;

        let tmp_path = self.file_path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, bytes).await?;
        tokio::fs::rename(&tmp_path, &self.file_path).await?;

        debug!("Persisted {} claims to {}", file.points.len(), self.file_path.display());
        Ok(())
    }
}

#[async_trait]
impl ClaimIndex for LocalClaimIndex {
    async fn count(&self) -> Result<usize> {
        Ok(self.collection.read().await.points.len())
    }

    async fn upsert(&self, claims: Vec<IndexedClaim>) -> Result<()> {
        let mut collection = self.collection.write().await;
        for claim in claims {
            collection.points.insert(claim.id.clone(), claim);
        }
        self.persist(&collection).await
    }

    async fn nearest(&self, vector: &[f32]) -> Result<Option<IndexMatch>> {
        let collection = self.collection.read().await;

        let mut best: Option<(&IndexedClaim, f32)> = None;
        for point in collection.points.values() {
            if point.embedding.len() != vector.len() {
                return Err(NewsSenseError::Store(format!(
                    "dimension mismatch: query has {}, claim {} has {}",
                    vector.len(),
                    point.id,
                    point.embedding.len()
                )));
            }

            let distance = cosine_distance(vector, &point.embedding);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((point, distance));
            }
        }

        Ok(best.map(|(point, distance)| IndexMatch {
            id: point.id.clone(),
            document: point.document.clone(),
            metadata: point.metadata.clone(),
            distance,
        }))
    }

    async fn stamp(&self) -> Result<Option<EmbedderStamp>> {
        Ok(self.collection.read().await.embedder.clone())
    }

    async fn reset(&self, stamp: &EmbedderStamp) -> Result<()> {
        let mut collection = self.collection.write().await;
        collection.points.clear();
        collection.embedder = Some(stamp.clone());
        self.persist(&collection).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::knowledge::models::ClaimMetadata;

    pub(crate) fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("news-sense-{}-{}", tag, uuid::Uuid::new_v4()))
    }

    fn claim(id: &str, embedding: Vec<f32>) -> IndexedClaim {
        IndexedClaim {
            id: id.to_string(),
            document: format!("document {}", id),
            embedding,
            metadata: ClaimMetadata {
                verdict: "False.".to_string(),
                summary: "summary".to_string(),
                sources: r#"["Internal Knowledge Base"]"#.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_empty_index_has_no_nearest() {
        let dir = temp_dir("empty");
        let index = LocalClaimIndex::open(&dir, "knowledge_base").await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
        assert!(index.nearest(&[1.0, 0.0]).await.unwrap().is_none());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_nearest_picks_smallest_distance() {
        let dir = temp_dir("nearest");
        let index = LocalClaimIndex::open(&dir, "knowledge_base").await.unwrap();
        index
            .upsert(vec![claim("id_1", vec![1.0, 0.0]), claim("id_2", vec![0.0, 1.0])])
            .await
            .unwrap();

        let hit = index.nearest(&[0.1, 0.9]).await.unwrap().unwrap();
        assert_eq!(hit.id, "id_2");
        assert!(hit.distance < 0.1);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_id_and_persists() {
        let dir = temp_dir("persist");
        {
            let index = LocalClaimIndex::open(&dir, "knowledge_base").await.unwrap();
            index.upsert(vec![claim("id_1", vec![1.0, 0.0])]).await.unwrap();
            index.upsert(vec![claim("id_1", vec![0.0, 1.0])]).await.unwrap();
            assert_eq!(index.count().await.unwrap(), 1);
        }

        let reopened = LocalClaimIndex::open(&dir, "knowledge_base").await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        let hit = reopened.nearest(&[0.0, 1.0]).await.unwrap().unwrap();
        assert_eq!(hit.id, "id_1");
        assert!(hit.distance < 1e-6);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_an_error() {
        let dir = temp_dir("mismatch");
        let index = LocalClaimIndex::open(&dir, "knowledge_base").await.unwrap();
        index.upsert(vec![claim("id_1", vec![1.0, 0.0, 0.0])]).await.unwrap();

        let err = index.nearest(&[1.0, 0.0]).await.unwrap_err();
        assert!(matches!(err, NewsSenseError::Store(_)));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_reset_clears_points_and_persists_stamp() {
        let dir = temp_dir("stamp");
        let stamp = EmbedderStamp {
            model: "feature-hashing".to_string(),
            dimension: 2,
        };
        {
            let index = LocalClaimIndex::open(&dir, "knowledge_base").await.unwrap();
            assert_eq!(index.stamp().await.unwrap(), None);
            index.upsert(vec![claim("id_1", vec![1.0, 0.0, 0.0])]).await.unwrap();

            index.reset(&stamp).await.unwrap();
            assert_eq!(index.count().await.unwrap(), 0);
            index.upsert(vec![claim("id_1", vec![1.0, 0.0])]).await.unwrap();
        }

        let reopened = LocalClaimIndex::open(&dir, "knowledge_base").await.unwrap();
        assert_eq!(reopened.stamp().await.unwrap(), Some(stamp));
        assert_eq!(reopened.count().await.unwrap(), 1);
        let _ = std::fs::remove_dir_all(dir);
    }
}
