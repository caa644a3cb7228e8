//! The news sense agents: a dispatcher and three specialists

use super::agent::Agent;
use super::schemas::OutputKind;
use crate::knowledge::KnowledgeStore;
use crate::search::WebSearch;
use crate::tools::{FactCheckClaimTool, SearchTavilyTool, SummarizeNewsTool, ToolRegistry};
use std::sync::Arc;

pub const DISPATCHER_AGENT: &str = "News Sense Agent";
pub const TRENDING_NEWS_AGENT: &str = "Trending News Agent";
pub const FACT_CHECK_AGENT: &str = "Fact Check Agent";
pub const ARTICLE_SUMMARIZER_AGENT: &str = "Article Summarizer";

const DISPATCHER_INSTRUCTIONS: &str = "\
You are a news sense assistant. Your role is to identify the right specialist agent to hand off to.
You can hand off to specialist agents for specific tasks like Fact Checker, News Summarizer or Trending News Specialist.

Don't try to answer the user's question directly. Instead, analyze the query and determine which specialist agent is best suited to handle it.";

const TRENDING_NEWS_INSTRUCTIONS: &str = r#"This agent helps users find trending news articles on any topic.

Use the following guidelines:
1. Identify the most frequently mentioned stories
2. Rank them by importance and recency
3. Include only verified sources
4. Provide concise headlines with direct links

Example output format:
{
    "topic": "Politics in Bangladesh",
    "headlines": [
        {
            "rank": 1,
            "headline": "Election results announced",
            "source": "https://example.com/news/123"
        }
    ]
}"#;

const FACT_CHECK_INSTRUCTIONS: &str = "\
This agent will check the validity of claims made in news articles.

You will use a local knowledge base to verify claims with the fact_check_claim tool.
If the claim is found, return the verdict, summary, and sources.

If the claim is not found, return a message indicating that the claim could not be verified.";

const SUMMARIZER_INSTRUCTIONS: &str = "\
This agent helps users summarize articles into concise overviews.

Make bullet points of the key information in the article.
Focus on the most important details and insights.
Avoid unnecessary details or filler content.
Use clear, concise language.";

pub fn dispatcher_agent() -> Agent {
    Agent::new(
        DISPATCHER_AGENT,
        "Conversational agent. Provides news sense and connects to appropriate agent.",
        DISPATCHER_INSTRUCTIONS,
    )
    .with_handoffs([TRENDING_NEWS_AGENT, FACT_CHECK_AGENT, ARTICLE_SUMMARIZER_AGENT])
}

pub fn trending_news_agent(search: Arc<dyn WebSearch>, max_results: usize) -> Agent {
    Agent::new(
        TRENDING_NEWS_AGENT,
        "Finds trending news articles based on user-defined topics.",
        TRENDING_NEWS_INSTRUCTIONS,
    )
    .with_tools(ToolRegistry::new().with(Arc::new(SearchTavilyTool::new(search, max_results))))
    .with_output(OutputKind::TrendingNews)
}

pub fn fact_check_agent(store: Arc<KnowledgeStore>) -> Agent {
    Agent::new(
        FACT_CHECK_AGENT,
        "Fact-checks claims and provides evidence-based responses.",
        FACT_CHECK_INSTRUCTIONS,
    )
    .with_tools(ToolRegistry::new().with(Arc::new(FactCheckClaimTool::new(store))))
    .with_output(OutputKind::FactCheck)
}

pub fn article_summarizer_agent() -> Agent {
    Agent::new(
        ARTICLE_SUMMARIZER_AGENT,
        "Summarizes articles into concise overviews.",
        SUMMARIZER_INSTRUCTIONS,
    )
    .with_tools(ToolRegistry::new().with(Arc::new(SummarizeNewsTool)))
    .with_output(OutputKind::Summary)
}
