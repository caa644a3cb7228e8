//! Data models for the claim knowledge base

use serde::{Deserialize, Serialize};

/// A verified claim, as seeded into the knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub id: String,
    pub question_text: String,
    pub verdict: String,
    pub summary: String,
    pub sources: Vec<String>,
}

impl ClaimRecord {
    /// Flatten into the stored metadata shape (sources as a JSON string)
    pub fn to_metadata(&self) -> Result<ClaimMetadata, serde_json::Error> {
        Ok(ClaimMetadata {
            verdict: self.verdict.clone(),
            summary: self.summary.clone(),
            sources: serde_json::to_string(&self.sources)?,
        })
    }
}

/// Metadata persisted next to each claim embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimMetadata {
    pub verdict: String,
    pub summary: String,
    /// JSON-encoded array of source names
    pub sources: String,
}

impl ClaimMetadata {
    /// Decode back into a verification result
    pub fn to_verification(&self) -> Result<VerificationResult, serde_json::Error> {
        Ok(VerificationResult {
            verdict: self.verdict.clone(),
            summary: self.summary.clone(),
            sources: serde_json::from_str(&self.sources)?,
        })
    }
}

/// Identifies the embedder that produced a collection's vectors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedderStamp {
    pub model: String,
    pub dimension: usize,
}

impl std::fmt::Display for EmbedderStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} dims)", self.model, self.dimension)
    }
}

/// A claim as stored in an index: id, document text, embedding and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedClaim {
    pub id: String,
    pub document: String,
    pub embedding: Vec<f32>,
    pub metadata: ClaimMetadata,
}

/// Nearest stored claim for a query vector
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
    pub id: String,
    pub document: String,
    pub metadata: ClaimMetadata,
    /// Cosine distance, `1 - cosine_similarity`
    pub distance: f32,
}

/// Outcome of verifying one claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verdict: String,
    pub summary: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl VerificationResult {
    pub const NOT_FOUND_VERDICT: &'static str = "Not found";
    pub const NOT_FOUND_SUMMARY: &'static str = "Could not verify this claim with available data.";

    /// The canned result for a claim with no confident match
    pub fn not_found() -> Self {
        Self {
            verdict: Self::NOT_FOUND_VERDICT.to_string(),
            summary: Self::NOT_FOUND_SUMMARY.to_string(),
            sources: Vec::new(),
        }
    }
}

/// Whether the fact-check found a confident match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactCheckStatus {
    Success,
    Info,
}

impl FactCheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactCheckStatus::Success => "success",
            FactCheckStatus::Info => "info",
        }
    }
}

/// Result of the fact-check tool and final output of the fact-check agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCheckOutput {
    pub status: FactCheckStatus,
    pub result: VerificationResult,
}

impl FactCheckOutput {
    pub fn not_found() -> Self {
        Self {
            status: FactCheckStatus::Info,
            result: VerificationResult::not_found(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_sources_are_json_encoded() {
        let record = ClaimRecord {
            id: "id_1".to_string(),
            question_text: "q".to_string(),
            verdict: "False.".to_string(),
            summary: "s".to_string(),
            sources: vec!["TechCrunch Report".to_string(), "Bloomberg News".to_string()],
        };

        let metadata = record.to_metadata().unwrap();
        assert_eq!(metadata.sources, r#"["TechCrunch Report","Bloomberg News"]"#);

        let verification = metadata.to_verification().unwrap();
        assert_eq!(verification.sources, record.sources);
    }

    #[test]
    fn test_not_found_output_shape() {
        let output = FactCheckOutput::not_found();
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["status"], "info");
        assert_eq!(value["result"]["verdict"], "Not found");
        assert_eq!(value["result"]["sources"], serde_json::json!([]));
    }

    #[test]
    fn test_sources_default_to_empty() {
        let parsed: VerificationResult =
            serde_json::from_str(r#"{"verdict":"Not found","summary":"x"}"#).unwrap();
        assert!(parsed.sources.is_empty());
    }
}
