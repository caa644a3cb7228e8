//! Integration tests for the fact-check knowledge base
//!
//! These run against the embedded local index with the offline hashing
//! embedder, so no network or Qdrant instance is needed.

use news_sense::config::Config;
use news_sense::knowledge::{
    decide, FactCheckOutput, FactCheckStatus, HashingEmbedder, IndexMatch, KnowledgeStore,
    LocalClaimIndex,
};
use std::path::PathBuf;
use std::sync::Arc;

fn temp_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("news-sense-it-{}-{}", tag, uuid::Uuid::new_v4()))
}

fn config_for(dir: &PathBuf) -> Config {
    let path = dir.to_string_lossy().to_string();
    Config::from_lookup(move |key: &str| match key {
        "BASE_URL" => Some("http://localhost:9".to_string()),
        "API_KEY" => Some("sk-test".to_string()),
        "MODEL_NAME" => Some("test-model".to_string()),
        "TAVILY_API_KEY" => Some("tvly-test".to_string()),
        "KNOWLEDGE_DB_PATH" => Some(path.clone()),
        _ => None,
    })
    .unwrap()
}

#[tokio::test]
async fn test_open_seeds_and_verifies_known_claim() {
    let dir = temp_dir("open");
    let store = KnowledgeStore::open(&config_for(&dir)).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 2);

    let output = store.check("did apple acquire openai?").await.unwrap();
    assert_eq!(output.status, FactCheckStatus::Success);
    assert_eq!(output.result.verdict, "False.");
    assert_eq!(
        output.result.summary,
        "There is no credible evidence or official announcement that Apple has acquired OpenAI. This is a false claim."
    );
    assert_eq!(output.result.sources, vec!["Internal Knowledge Base".to_string()]);

    assert!(dir.join("knowledge_base.json").exists());
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_unknown_claim_is_info_not_found() {
    let dir = temp_dir("unknown");
    let store = KnowledgeStore::open(&config_for(&dir)).await.unwrap();

    let output = store
        .check("Is Google launching a new smartphone?")
        .await
        .unwrap();
    assert_eq!(output, FactCheckOutput::not_found());
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_reopen_keeps_two_records_and_same_answers() {
    let dir = temp_dir("reopen");
    let claim = "is openai partnering with apple?";

    let first = KnowledgeStore::open(&config_for(&dir)).await.unwrap();
    let before = first.check(claim).await.unwrap();
    drop(first);

    let second = KnowledgeStore::open(&config_for(&dir)).await.unwrap();
    assert_eq!(second.count().await.unwrap(), 2);
    let after = second.check(claim).await.unwrap();

    assert_eq!(before, after);
    assert_eq!(after.result.sources, vec!["TechCrunch Report", "Bloomberg News"]);
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_threshold_from_config_is_respected() {
    let dir = temp_dir("threshold");
    let index = LocalClaimIndex::open(&dir, "knowledge_base").await.unwrap();
    // A zero threshold can never be undercut, not even by an exact match
    let store = KnowledgeStore::new(Arc::new(index), Arc::new(HashingEmbedder::default()), 0.0);

    let output = store.check("did apple acquire openai?").await.unwrap();
    assert_eq!(output.status, FactCheckStatus::Info);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_distance_exactly_at_threshold_is_not_a_match() {
    let hit = IndexMatch {
        id: "id_1".to_string(),
        document: "is openai partnering with apple?".to_string(),
        metadata: news_sense::knowledge::ClaimMetadata {
            verdict: "Unconfirmed, but widely rumored.".to_string(),
            summary: "s".to_string(),
            sources: "[]".to_string(),
        },
        distance: 0.6,
    };
    assert_eq!(decide(Some(hit), 0.6).unwrap(), FactCheckOutput::not_found());
}
