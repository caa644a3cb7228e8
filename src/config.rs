//! Configuration for the news sense assistant
//!
//! Values are layered the same way everywhere: built-in defaults, then an
//! optional `news_sense.toml`, then environment variables (a `.env` file is
//! loaded first if present).
//!
//! Required environment variables:
//! - `BASE_URL` - OpenAI-compatible endpoint base, e.g. `https://api.openai.com/v1`
//! - `API_KEY` - key for that endpoint
//! - `MODEL_NAME` - chat model id
//! - `TAVILY_API_KEY` - key for the Tavily search API
//!
//! Everything else is optional, see [`Config::apply_env`].

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default configuration file name (extension resolved by the `config` crate)
pub const DEFAULT_CONFIG_FILE: &str = "news_sense";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to read configuration file: {0}")]
    File(String),
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}

/// LLM endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API (without `/chat/completions`)
    #[serde(default)]
    pub base_url: String,

    #[serde(default = "empty_secret")]
    pub api_key: SecretString,

    /// Chat model id
    #[serde(default)]
    pub model: String,

    /// Embedding model id; when unset the offline hashing embedder is used
    #[serde(default)]
    pub embedding_model: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_timeout_secs() -> u64 { 30 }
fn default_max_retries() -> usize { 2 }
fn default_retry_backoff_ms() -> u64 { 200 }
fn default_temperature() -> f32 { 0.2 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: empty_secret(),
            model: String::new(),
            embedding_model: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Full URL of the chat completions endpoint
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Full URL of the embeddings endpoint
    pub fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}

/// Web search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "empty_secret")]
    pub tavily_api_key: SecretString,

    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_search_max_results")]
    pub max_results: usize,

    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_search_endpoint() -> String { "https://api.tavily.com".to_string() }
fn default_search_max_results() -> usize { 20 }
fn default_search_timeout_secs() -> u64 { 30 }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tavily_api_key: empty_secret(),
            endpoint: default_search_endpoint(),
            max_results: default_search_max_results(),
            timeout_secs: default_search_timeout_secs(),
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Knowledge store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeConfig {
    /// Directory of the embedded store
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_collection")]
    pub collection_name: String,

    /// Cosine distance below which a stored claim counts as a match
    #[serde(default = "default_threshold")]
    pub distance_threshold: f32,

    /// Dimension of the offline hashing embedder
    #[serde(default = "default_hashing_dimension")]
    pub hashing_dimension: usize,

    /// Qdrant URL; when set, the collection lives in Qdrant instead of on disk
    #[serde(default)]
    pub qdrant_url: Option<String>,

    #[serde(default = "default_embedding_cache_size")]
    pub embedding_cache_size: u64,
}

fn default_db_path() -> PathBuf { PathBuf::from("./knowledge_db") }
fn default_collection() -> String { "knowledge_base".to_string() }
fn default_threshold() -> f32 { 0.6 }
fn default_hashing_dimension() -> usize { 384 }
fn default_embedding_cache_size() -> u64 { 1000 }

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            collection_name: default_collection(),
            distance_threshold: default_threshold(),
            hashing_dimension: default_hashing_dimension(),
            qdrant_url: None,
            embedding_cache_size: default_embedding_cache_size(),
        }
    }
}

/// Agent runtime configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentsConfig {
    /// Maximum model round-trips per dispatch
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Send the specialist's JSON schema as `response_format`
    #[serde(default = "default_structured_output")]
    pub structured_output: bool,
}

fn default_max_turns() -> usize { 10 }
fn default_structured_output() -> bool { true }

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            structured_output: default_structured_output(),
        }
    }
}

/// Chat server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// Idle time after which a session is dropped
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8501 }
fn default_body_limit() -> usize { 1024 * 1024 }
fn default_session_ttl_secs() -> u64 { 3600 }
fn default_max_sessions() -> usize { 1000 }

impl ChatConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
            session_ttl_secs: default_session_ttl_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub json: bool,

    /// Logfire token; accepted for compatibility, traces stay local
    #[serde(default)]
    pub logfire_token: Option<SecretString>,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
            logfire_token: None,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Config {
    /// Load `.env`, the default config file and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load `.env`, the given config file (optional) and the process environment
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = Self::from_file(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read tunables from a config file; a missing file yields defaults
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| ConfigError::File(e.to_string()))
    }

    /// Build from defaults plus the given variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Override values with environment variables
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("BASE_URL") {
            self.llm.base_url = val;
        }
        if let Some(val) = lookup("API_KEY") {
            self.llm.api_key = SecretString::new(val);
        }
        if let Some(val) = lookup("MODEL_NAME") {
            self.llm.model = val;
        }
        if let Some(val) = lookup("EMBEDDING_MODEL") {
            self.llm.embedding_model = Some(val).filter(|v| !v.is_empty());
        }
        if let Some(val) = lookup("LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_var("LLM_TIMEOUT_SECS", &val)?;
        }
        if let Some(val) = lookup("LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_var("LLM_MAX_RETRIES", &val)?;
        }

        if let Some(val) = lookup("TAVILY_API_KEY") {
            self.search.tavily_api_key = SecretString::new(val);
        }
        if let Some(val) = lookup("SEARCH_MAX_RESULTS") {
            self.search.max_results = parse_var("SEARCH_MAX_RESULTS", &val)?;
        }

        if let Some(val) = lookup("KNOWLEDGE_DB_PATH") {
            self.knowledge.path = PathBuf::from(val);
        }
        if let Some(val) = lookup("KNOWLEDGE_COLLECTION") {
            self.knowledge.collection_name = val;
        }
        if let Some(val) = lookup("FACT_CHECK_THRESHOLD") {
            self.knowledge.distance_threshold = parse_var("FACT_CHECK_THRESHOLD", &val)?;
        }
        if let Some(val) = lookup("QDRANT_URL") {
            self.knowledge.qdrant_url = Some(val).filter(|v| !v.is_empty());
        }

        if let Some(val) = lookup("AGENT_MAX_TURNS") {
            self.agents.max_turns = parse_var("AGENT_MAX_TURNS", &val)?;
        }

        if let Some(val) = lookup("CHAT_HOST") {
            self.chat.host = val;
        }
        if let Some(val) = lookup("CHAT_PORT") {
            self.chat.port = parse_var("CHAT_PORT", &val)?;
        }
        if let Some(val) = lookup("CHAT_SESSION_TTL_SECS") {
            self.chat.session_ttl_secs = parse_var("CHAT_SESSION_TTL_SECS", &val)?;
        }
        if let Some(val) = lookup("CHAT_MAX_SESSIONS") {
            self.chat.max_sessions = parse_var("CHAT_MAX_SESSIONS", &val)?;
        }

        if let Some(val) = lookup("LOG_LEVEL") {
            self.telemetry.log_level = val;
        }
        if let Some(val) = lookup("LOG_JSON") {
            self.telemetry.json = val.to_lowercase() == "true" || val == "1";
        }
        if let Some(val) = lookup("LOGFIRE_TOKEN") {
            if !val.is_empty() {
                self.telemetry.logfire_token = Some(SecretString::new(val));
            }
        }

        Ok(())
    }

    /// Fail fast when a required value is absent
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.base_url.is_empty() {
            return Err(ConfigError::MissingEnvVar("BASE_URL".to_string()));
        }
        if self.llm.api_key.expose_secret().is_empty() {
            return Err(ConfigError::MissingEnvVar("API_KEY".to_string()));
        }
        if self.llm.model.is_empty() {
            return Err(ConfigError::MissingEnvVar("MODEL_NAME".to_string()));
        }
        if self.search.tavily_api_key.expose_secret().is_empty() {
            return Err(ConfigError::MissingEnvVar("TAVILY_API_KEY".to_string()));
        }

        let threshold = self.knowledge.distance_threshold;
        if !(0.0..=2.0).contains(&threshold) {
            return Err(ConfigError::InvalidValue(
                "FACT_CHECK_THRESHOLD".to_string(),
                format!("{} is outside the cosine distance range [0, 2]", threshold),
            ));
        }
        if self.agents.max_turns == 0 {
            return Err(ConfigError::InvalidValue(
                "AGENT_MAX_TURNS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if self.chat.max_sessions == 0 {
            return Err(ConfigError::InvalidValue(
                "CHAT_MAX_SESSIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("BASE_URL", "http://localhost:11434/v1"),
        ("API_KEY", "sk-test"),
        ("MODEL_NAME", "gpt-4o-mini"),
        ("TAVILY_API_KEY", "tvly-test"),
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.knowledge.distance_threshold, 0.6);
        assert_eq!(config.knowledge.collection_name, "knowledge_base");
        assert_eq!(config.search.max_results, 20);
        assert_eq!(config.agents.max_turns, 10);
        assert_eq!(config.chat.port, 8501);
    }

    #[test]
    fn test_from_lookup_with_required_vars() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.api_key.expose_secret(), "sk-test");
        assert_eq!(
            config.llm.chat_completions_url(),
            "http://localhost:11434/v1/chat/completions"
        );
        assert!(config.llm.embedding_model.is_none());
        assert!(config.telemetry.logfire_token.is_none());
    }

    #[test]
    fn test_missing_required_var_names_it() {
        for (missing, _) in REQUIRED {
            let pairs: Vec<(&str, &str)> =
                REQUIRED.iter().copied().filter(|(k, _)| *k != missing).collect();
            let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
            match err {
                ConfigError::MissingEnvVar(name) => assert_eq!(name, missing),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_optional_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("FACT_CHECK_THRESHOLD", "0.45"));
        pairs.push(("AGENT_MAX_TURNS", "4"));
        pairs.push(("LOG_JSON", "true"));
        pairs.push(("LOGFIRE_TOKEN", "pylf_test"));
        pairs.push(("QDRANT_URL", "http://localhost:6334"));

        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.knowledge.distance_threshold, 0.45);
        assert_eq!(config.agents.max_turns, 4);
        assert!(config.telemetry.json);
        assert!(config.telemetry.logfire_token.is_some());
        assert_eq!(
            config.knowledge.qdrant_url.as_deref(),
            Some("http://localhost:6334")
        );
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("CHAT_PORT", "not-a-port"));
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "CHAT_PORT"));
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-test"));
        assert!(!debug.contains("tvly-test"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::from_file("definitely_not_here_news_sense").unwrap();
        assert_eq!(config.knowledge.distance_threshold, 0.6);
    }
}
