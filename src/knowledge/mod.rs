//! Claim knowledge base used by the fact-check agent
//!
//! Seeded claims are embedded and stored in a persistent collection; a claim
//! is verified when its nearest stored claim lies strictly within the
//! configured cosine distance.

pub mod embedding;
pub mod index;
pub mod models;
pub mod qdrant;
pub mod seed;
pub mod store;

pub use embedding::{cosine_distance, Embedder, HashingEmbedder, RemoteEmbedder};
pub use index::{ClaimIndex, LocalClaimIndex};
pub use models::{
    ClaimMetadata, ClaimRecord, EmbedderStamp, FactCheckOutput, FactCheckStatus, IndexMatch,
    IndexedClaim, VerificationResult,
};
pub use qdrant::QdrantClaimIndex;
pub use seed::seed_records;
pub use store::{decide, KnowledgeStore};
