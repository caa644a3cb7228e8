//! Query dispatch through the news sense agent

use crate::agents::{
    article_summarizer_agent, dispatcher_agent, fact_check_agent, trending_news_agent,
    AgentOutput, AgentRunner, RunnerSettings, DISPATCHER_AGENT,
};
use crate::config::Config;
use crate::error::Result;
use crate::knowledge::KnowledgeStore;
use crate::llm::{ChatClient, OpenAiChatClient};
use crate::metrics::METRICS;
use crate::search::{TavilyClient, WebSearch};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Routes each query to the specialist best suited to answer it.
///
/// Built once at startup; cheap to share behind an `Arc`.
pub struct Dispatcher {
    runner: AgentRunner,
}

impl Dispatcher {
    /// Connect every client named by the configuration
    pub async fn from_config(config: &Config) -> Result<Self> {
        let chat: Arc<dyn ChatClient> = Arc::new(OpenAiChatClient::new(&config.llm)?);
        let search: Arc<dyn WebSearch> = Arc::new(TavilyClient::new(&config.search)?);
        let store = Arc::new(KnowledgeStore::open(config).await?);

        Self::new(chat, search, store, config)
    }

    /// Assemble the agents around already-built clients
    pub fn new(
        chat: Arc<dyn ChatClient>,
        search: Arc<dyn WebSearch>,
        store: Arc<KnowledgeStore>,
        config: &Config,
    ) -> Result<Self> {
        let settings = RunnerSettings {
            model: config.llm.model.clone(),
            temperature: Some(config.llm.temperature),
            max_turns: config.agents.max_turns,
            structured_output: config.agents.structured_output,
        };

        let runner = AgentRunner::new(chat, settings)
            .with_agent(dispatcher_agent())
            .with_agent(trending_news_agent(search, config.search.max_results))
            .with_agent(fact_check_agent(store))
            .with_agent(article_summarizer_agent());
        runner.validate()?;

        info!("Dispatcher ready with model {}", config.llm.model);
        Ok(Self { runner })
    }

    /// Answer one user query
    #[instrument(skip(self))]
    pub async fn dispatch(&self, query: &str) -> Result<AgentOutput> {
        let started = Instant::now();
        let result = self.runner.run(DISPATCHER_AGENT, query).await;

        let outcome = if result.is_ok() { "success" } else { "error" };
        METRICS
            .dispatch_duration
            .with_label_values(&[outcome])
            .observe(started.elapsed().as_secs_f64());

        match result {
            Ok(run) => {
                METRICS.record_dispatch(&run.final_agent);
                info!(
                    "{} produced {} output in {} turns",
                    run.final_agent,
                    run.output.kind(),
                    run.turns
                );
                Ok(run.output)
            }
            Err(e) => {
                error!("Dispatch failed: {}", e);
                Err(e)
            }
        }
    }
}
