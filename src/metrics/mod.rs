//! Metrics collection for observability

use prometheus::{
    CounterVec, HistogramVec, Opts, Registry,
    register_counter_vec_with_registry, register_histogram_vec_with_registry,
};
use std::sync::Arc;
use once_cell::sync::Lazy;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Dispatch metrics
    pub dispatches: CounterVec,
    pub handoffs: CounterVec,
    pub dispatch_duration: HistogramVec,

    // Tool metrics
    pub tool_calls: CounterVec,
    pub tool_duration: HistogramVec,

    // Fact-check metrics
    pub fact_checks: CounterVec,

    // Upstream metrics
    pub llm_requests: CounterVec,
    pub search_requests: CounterVec,

    // Chat metrics
    pub chat_turns: CounterVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();

        let dispatches = register_counter_vec_with_registry!(
            Opts::new("news_sense_dispatches_total", "Dispatches by answering agent"),
            &["agent"],
            registry
        )?;

        let handoffs = register_counter_vec_with_registry!(
            Opts::new("news_sense_handoffs_total", "Hand-offs by target agent"),
            &["target"],
            registry
        )?;

        let dispatch_duration = register_histogram_vec_with_registry!(
            "news_sense_dispatch_duration_seconds",
            "End-to-end dispatch duration in seconds",
            &["outcome"],
            registry
        )?;

        let tool_calls = register_counter_vec_with_registry!(
            Opts::new("news_sense_tool_calls_total", "Tool invocations"),
            &["tool", "status"],
            registry
        )?;

        let tool_duration = register_histogram_vec_with_registry!(
            "news_sense_tool_duration_seconds",
            "Tool invocation duration in seconds",
            &["tool"],
            registry
        )?;

        let fact_checks = register_counter_vec_with_registry!(
            Opts::new("news_sense_fact_checks_total", "Fact-check outcomes"),
            &["status"],
            registry
        )?;

        let llm_requests = register_counter_vec_with_registry!(
            Opts::new("news_sense_llm_requests_total", "Chat completion requests"),
            &["status"],
            registry
        )?;

        let search_requests = register_counter_vec_with_registry!(
            Opts::new("news_sense_search_requests_total", "Web search requests"),
            &["status"],
            registry
        )?;

        let chat_turns = register_counter_vec_with_registry!(
            Opts::new("news_sense_chat_turns_total", "Chat turns processed"),
            &["status"],
            registry
        )?;

        Ok(Self {
            registry,
            dispatches,
            handoffs,
            dispatch_duration,
            tool_calls,
            tool_duration,
            fact_checks,
            llm_requests,
            search_requests,
            chat_turns,
        })
    }

    /// Record which agent produced a dispatch result
    pub fn record_dispatch(&self, agent: &str) {
        self.dispatches.with_label_values(&[agent]).inc();
    }

    /// Record a hand-off to a specialist
    pub fn record_handoff(&self, target: &str) {
        self.handoffs.with_label_values(&[target]).inc();
    }

    /// Record a tool invocation
    pub fn record_tool_call(&self, tool: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        self.tool_calls.with_label_values(&[tool, status]).inc();
    }

    /// Record a fact-check outcome (`success`, `info` or `error`)
    pub fn record_fact_check(&self, status: &str) {
        self.fact_checks.with_label_values(&[status]).inc();
    }

    /// Record a chat completion request
    pub fn record_llm_request(&self, success: bool) {
        let status = if success { "success" } else { "error" };
        self.llm_requests.with_label_values(&[status]).inc();
    }

    /// Record a web search request
    pub fn record_search(&self, success: bool) {
        let status = if success { "success" } else { "error" };
        self.search_requests.with_label_values(&[status]).inc();
    }

    /// Record a processed chat turn
    pub fn record_chat_turn(&self, success: bool) {
        let status = if success { "success" } else { "error" };
        self.chat_turns.with_label_values(&[status]).inc();
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();

        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Helper macro to time operations
#[macro_export]
macro_rules! time_operation {
    ($histogram:expr, $label:expr, $operation:expr) => {{
        let timer = $histogram.with_label_values(&[$label]).start_timer();
        let result = $operation;
        timer.observe_duration();
        result
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let metrics = Metrics::new();
        assert!(metrics.is_ok());
    }

    #[test]
    fn test_export_contains_recorded_series() {
        let metrics = Metrics::new().unwrap();
        metrics.record_dispatch("Fact Check Agent");
        metrics.record_fact_check("info");
        metrics.record_tool_call("fact_check_claim", true);

        let text = metrics.export_prometheus();
        assert!(text.contains("news_sense_dispatches_total"));
        assert!(text.contains("news_sense_fact_checks_total{status=\"info\"} 1"));
        assert!(text.contains("tool=\"fact_check_claim\""));
    }

    #[tokio::test]
    async fn test_time_operation_macro() {
        let metrics = Metrics::new().unwrap();
        let value = time_operation!(metrics.tool_duration, "noop", async { 7 }.await);
        assert_eq!(value, 7);
        assert!(metrics.export_prometheus().contains("news_sense_tool_duration_seconds"));
    }
}
