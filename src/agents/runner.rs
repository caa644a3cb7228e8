//! Agent loop: completions, tool calls and hand-offs

use super::agent::Agent;
use super::schemas::AgentOutput;
use crate::error::{NewsSenseError, Result};
use crate::llm::{
    ChatClient, ChatMessage, ChatRequest, JsonSchemaSpec, ResponseFormat, ToolDefinition,
};
use crate::metrics::METRICS;
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Outcome of one run
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Agent that produced the final answer
    pub final_agent: String,
    pub output: AgentOutput,
    /// Model round-trips used
    pub turns: usize,
}

/// Runtime settings shared by every agent
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_turns: usize,
    /// Send the active agent's output schema as `response_format`
    pub structured_output: bool,
}

/// Runs a conversation turn through a set of agents
pub struct AgentRunner {
    client: Arc<dyn ChatClient>,
    settings: RunnerSettings,
    agents: IndexMap<String, Agent>,
}

impl AgentRunner {
    pub fn new(client: Arc<dyn ChatClient>, settings: RunnerSettings) -> Self {
        Self {
            client,
            settings,
            agents: IndexMap::new(),
        }
    }

    pub fn register(&mut self, agent: Agent) {
        self.agents.insert(agent.name.clone(), agent);
    }

    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.register(agent);
        self
    }

    /// Make sure every declared hand-off names a registered agent
    pub fn validate(&self) -> Result<()> {
        for agent in self.agents.values() {
            for target in &agent.handoffs {
                if !self.agents.contains_key(target) {
                    return Err(NewsSenseError::UnknownAgent(format!(
                        "{} (hand-off from {})",
                        target, agent.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn agent_or_err(&self, name: &str) -> Result<&Agent> {
        self.agents
            .get(name)
            .ok_or_else(|| NewsSenseError::UnknownAgent(name.to_string()))
    }

    /// Hand-off functions offered by `agent`, keyed by function name
    fn handoff_targets(&self, agent: &Agent) -> Result<IndexMap<String, &Agent>> {
        let mut targets = IndexMap::new();
        for name in &agent.handoffs {
            let target = self.agent_or_err(name)?;
            targets.insert(target.transfer_function_name(), target);
        }
        Ok(targets)
    }

    fn build_request(
        &self,
        agent: &Agent,
        handoffs: &IndexMap<String, &Agent>,
        history: &[ChatMessage],
    ) -> ChatRequest {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(agent.instructions.clone()));
        messages.extend(history.iter().cloned());

        let mut tools: Vec<ToolDefinition> = agent.tools.definitions();
        tools.extend(handoffs.values().map(|target| target.handoff_tool()));

        let response_format = match agent.output {
            Some(kind) if self.settings.structured_output => Some(ResponseFormat::JsonSchema {
                json_schema: JsonSchemaSpec {
                    name: kind.schema_name().to_string(),
                    schema: kind.schema(),
                    strict: false,
                },
            }),
            _ => None,
        };

        ChatRequest {
            model: self.settings.model.clone(),
            messages,
            tools,
            response_format,
            temperature: self.settings.temperature,
        }
    }

    /// Run `input` starting at agent `start` until an agent gives a final answer
    #[instrument(skip(self, input))]
    pub async fn run(&self, start: &str, input: &str) -> Result<RunResult> {
        let mut current = self.agent_or_err(start)?;
        let mut history = vec![ChatMessage::user(input)];

        for turn in 1..=self.settings.max_turns {
            let handoffs = self.handoff_targets(current)?;
            let request = self.build_request(current, &handoffs, &history);

            debug!("Turn {}: asking {}", turn, current.name);
            let reply = self.client.complete(&request).await?;

            let calls = reply.requested_tool_calls().to_vec();
            if calls.is_empty() {
                let content = reply.content.unwrap_or_default();
                let output = finalize(current, &content)?;
                info!("{} answered after {} turns", current.name, turn);
                return Ok(RunResult {
                    final_agent: current.name.clone(),
                    output,
                    turns: turn,
                });
            }

            history.push(reply);

            let mut next: Option<&Agent> = None;
            for call in calls {
                let name = call.function.name.as_str();

                if let Some(target) = handoffs.get(name) {
                    let content = if next.is_none() {
                        next = Some(*target);
                        json!({ "assistant": target.name }).to_string()
                    } else {
                        "Error: only one hand-off per turn is allowed".to_string()
                    };
                    history.push(ChatMessage::tool_result(call.id, content));
                    continue;
                }

                let content = match current.tools.execute(name, &call.function.arguments).await {
                    Ok(value) => tool_output_text(value),
                    Err(e) => format!("Error: {}", e),
                };
                history.push(ChatMessage::tool_result(call.id, content));
            }

            if let Some(target) = next {
                info!("Handing off from {} to {}", current.name, target.name);
                METRICS.record_handoff(&target.name);
                current = target;
            }
        }

        warn!("No final answer after {} turns", self.settings.max_turns);
        Err(NewsSenseError::MaxTurnsExceeded(self.settings.max_turns))
    }
}

/// Tool results go back to the model as plain text
fn tool_output_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn finalize(agent: &Agent, content: &str) -> Result<AgentOutput> {
    match agent.output {
        Some(kind) => kind
            .parse(content)
            .map_err(|e| NewsSenseError::OutputValidation {
                agent: agent.name.clone(),
                message: e.to_string(),
            }),
        None => Ok(AgentOutput::probe(content)),
    }
}
