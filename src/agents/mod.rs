//! Agent runtime and the news sense agents

pub mod agent;
pub mod news;
pub mod runner;
pub mod schemas;

pub use agent::{transfer_function_name, Agent};
pub use news::{
    article_summarizer_agent, dispatcher_agent, fact_check_agent, trending_news_agent,
    ARTICLE_SUMMARIZER_AGENT, DISPATCHER_AGENT, FACT_CHECK_AGENT, TRENDING_NEWS_AGENT,
};
pub use runner::{AgentRunner, RunResult, RunnerSettings};
pub use schemas::{
    strip_code_fence, AgentOutput, NewsHeadline, OutputKind, SummarizeOutput, TrendingNews,
};
