//! Agent definitions: instructions, tools, output type and hand-offs

use super::schemas::OutputKind;
use crate::llm::ToolDefinition;
use crate::tools::ToolRegistry;
use serde_json::json;

/// A configured agent
#[derive(Clone)]
pub struct Agent {
    pub name: String,
    /// Shown to other agents when they consider handing off to this one
    pub handoff_description: String,
    pub instructions: String,
    pub tools: ToolRegistry,
    /// Structured output the agent must finish with; `None` means free text
    pub output: Option<OutputKind>,
    /// Names of agents this one may hand off to
    pub handoffs: Vec<String>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        handoff_description: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            handoff_description: handoff_description.into(),
            instructions: instructions.into(),
            tools: ToolRegistry::new(),
            output: None,
            handoffs: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_output(mut self, output: OutputKind) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_handoffs<I, S>(mut self, handoffs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.handoffs = handoffs.into_iter().map(Into::into).collect();
        self
    }

    /// Name of the function that hands the conversation to this agent
    pub fn transfer_function_name(&self) -> String {
        transfer_function_name(&self.name)
    }

    /// Function definition advertising a hand-off to this agent
    pub fn handoff_tool(&self) -> ToolDefinition {
        ToolDefinition::function(
            self.transfer_function_name(),
            format!(
                "Handoff to the {} agent to handle the request. {}",
                self.name, self.handoff_description
            ),
            json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        )
    }
}

/// `transfer_to_<snake_case name>`, e.g. `transfer_to_fact_check_agent`
pub fn transfer_function_name(agent_name: &str) -> String {
    let mut snake = String::with_capacity(agent_name.len());
    for c in agent_name.trim().chars() {
        if c.is_alphanumeric() {
            snake.extend(c.to_lowercase());
        } else if !snake.ends_with('_') {
            snake.push('_');
        }
    }
    format!("transfer_to_{}", snake.trim_end_matches('_'))
}
