//! Tracing subscriber setup

use crate::config::TelemetryConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Calling this twice is harmless;
/// the second install is ignored.
pub fn init_tracing(config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let installed = if config.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .is_ok()
    };

    if !installed {
        return;
    }

    if config.logfire_token.is_some() {
        warn!("LOGFIRE_TOKEN is set but remote trace export is not supported; logging locally");
    }
    info!(level = %config.log_level, json = config.json, "Tracing initialized");
}
