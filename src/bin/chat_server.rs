//! Chat server: the news sense assistant behind a small web page

use anyhow::Context;
use news_sense::chat::{build_router, ChatState};
use news_sense::{telemetry, Config, Dispatcher};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    telemetry::init_tracing(&config.telemetry);

    let dispatcher = Arc::new(Dispatcher::from_config(&config).await?);
    let state = ChatState::new(dispatcher, &config.chat);
    state.sessions.start_cleanup_task(Duration::from_secs(60));
    let app = build_router(state, &config.chat);

    let addr = format!("{}:{}", config.chat.host, config.chat.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("News Sense chat listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
