//! Integration tests for query dispatch
//!
//! The chat model is replaced by a scripted client so hand-offs, tool calls
//! and structured outputs can be checked without a live endpoint.

use async_trait::async_trait;
use news_sense::agents::AgentOutput;
use news_sense::config::Config;
use news_sense::knowledge::{FactCheckStatus, HashingEmbedder, KnowledgeStore, LocalClaimIndex};
use news_sense::llm::{ChatClient, ChatMessage, ChatRequest, LlmError, Role, ToolCall};
use news_sense::search::{SearchError, SearchHit, WebSearch};
use news_sense::{render_console, Dispatcher, NewsSenseError};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

struct ScriptedClient {
    replies: Mutex<VecDeque<ChatMessage>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    fn new(replies: Vec<ChatMessage>) -> Arc<Self> {
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

struct CannedSearch;

#[async_trait]
impl WebSearch for CannedSearch {
    async fn search(&self, query: &str, _: usize) -> Result<Vec<SearchHit>, SearchError> {
        Ok(vec![SearchHit {
            rank: 0.97,
            source: "https://example.com/news/123".to_string(),
            headline: format!("Latest on {}", query),
        }])
    }
}

fn call(id: &str, name: &str, args: &str) -> ChatMessage {
    ChatMessage::assistant_tool_calls(None, vec![ToolCall::new(id, name, args)])
}

fn temp_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("news-sense-dispatch-{}-{}", tag, uuid::Uuid::new_v4()))
}

async fn dispatcher(client: Arc<ScriptedClient>, dir: &PathBuf) -> Dispatcher {
    let index = LocalClaimIndex::open(dir, "knowledge_base").await.unwrap();
    let store = Arc::new(KnowledgeStore::new(
        Arc::new(index),
        Arc::new(HashingEmbedder::default()),
        0.6,
    ));
    let mut config = Config::default();
    config.llm.model = "test-model".to_string();
    config.agents.max_turns = 5;

    Dispatcher::new(client, Arc::new(CannedSearch), store, &config).unwrap()
}

#[tokio::test]
async fn test_handoff_to_fact_check_agent() {
    let dir = temp_dir("fact");
    let client = ScriptedClient::new(vec![
        call("c1", "transfer_to_fact_check_agent", "{}"),
        call("c2", "fact_check_claim", r#"{"claim":"did apple acquire openai?"}"#),
        ChatMessage::assistant(
            "```json\n{\"status\":\"success\",\"result\":{\"verdict\":\"False.\",\"summary\":\"There is no credible evidence.\",\"sources\":[\"Internal Knowledge Base\"]}}\n```",
        ),
    ]);
    let dispatcher = dispatcher(client.clone(), &dir).await;

    let output = dispatcher.dispatch("Did Apple acquire OpenAI?").await.unwrap();
    match &output {
        AgentOutput::FactCheck(check) => {
            assert_eq!(check.status, FactCheckStatus::Success);
            assert_eq!(check.result.verdict, "False.");
        }
        other => panic!("expected fact check, got {:?}", other),
    }

    let requests = client.requests.lock().unwrap();
    // The dispatcher is offered one transfer function per specialist
    let offered: Vec<&str> = requests[0]
        .tools
        .iter()
        .map(|t| t.function.name.as_str())
        .collect();
    assert_eq!(
        offered,
        vec![
            "transfer_to_trending_news_agent",
            "transfer_to_fact_check_agent",
            "transfer_to_article_summarizer",
        ]
    );

    // The tool result carries the knowledge base verdict
    let tool_reply = requests[2]
        .messages
        .iter()
        .rev()
        .find(|m| m.role == Role::Tool)
        .and_then(|m| m.content.clone())
        .unwrap();
    let tool_value: serde_json::Value = serde_json::from_str(&tool_reply).unwrap();
    assert_eq!(tool_value["status"], "success");
    assert_eq!(tool_value["result"]["sources"][0], "Internal Knowledge Base");

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_trending_news_flow_renders_for_console() {
    let dir = temp_dir("news");
    let client = ScriptedClient::new(vec![
        call("c1", "transfer_to_trending_news_agent", "{}"),
        call("c2", "search_tavily", r#"{"query":"AI"}"#),
        ChatMessage::assistant(
            r#"{"topic":"AI","headlines":[{"rank":1,"headline":"Latest on AI","source":"https://example.com/news/123"}]}"#,
        ),
    ]);
    let dispatcher = dispatcher(client, &dir).await;

    let output = dispatcher.dispatch("What is trending in AI?").await.unwrap();
    assert_eq!(
        render_console(&output),
        "  Rank #1: Latest on AI\n  Source: https://example.com/news/123\n\n"
    );

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_direct_answer_is_unrecognized() {
    let dir = temp_dir("direct");
    let client = ScriptedClient::new(vec![ChatMessage::assistant(
        "Data scientists need statistics, Python and SQL.",
    )]);
    let dispatcher = dispatcher(client, &dir).await;

    let output = dispatcher
        .dispatch("I want to become a Data Scientist. What skills do I need?")
        .await
        .unwrap();
    assert_eq!(render_console(&output), "Sorry, I can't assist with that.");

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_llm_failure_propagates() {
    let dir = temp_dir("fail");
    let dispatcher = dispatcher(ScriptedClient::new(vec![]), &dir).await;

    let err = dispatcher.dispatch("anything").await.unwrap_err();
    assert!(matches!(err, NewsSenseError::Llm(LlmError::EmptyResponse)));

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_missing_required_variable_is_named() {
    let err = Config::from_lookup(|key: &str| match key {
        "BASE_URL" => Some("http://localhost".to_string()),
        "API_KEY" => Some("sk-test".to_string()),
        "MODEL_NAME" => Some("m".to_string()),
        _ => None,
    })
    .unwrap_err();
    assert!(err.to_string().contains("TAVILY_API_KEY"));
}
