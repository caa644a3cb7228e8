//! News Sense: a news assistant that routes each query to a specialist agent
//!
//! A dispatcher agent hands the conversation to one of three specialists:
//! trending news search (Tavily), claim fact-checking against a seeded
//! vector knowledge base, and article summarization. Results come back as a
//! tagged [`agents::AgentOutput`] and are rendered for the console or the
//! chat page by [`presentation`].

pub mod agents;
pub mod chat;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod metrics;
pub mod presentation;
pub mod search;
pub mod telemetry;
pub mod tools;

pub use agents::AgentOutput;
pub use config::Config;
pub use dispatcher::Dispatcher;
pub use error::{NewsSenseError, Result};
pub use presentation::{render_chat_html, render_console};
