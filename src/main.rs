//! Console demo: dispatch one query and print the rendered answer

use anyhow::Context;
use news_sense::{render_console, telemetry, Config, Dispatcher};

const DEMO_QUERY: &str = "I want to become a Data Scientist. What skills do I need?";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    telemetry::init_tracing(&config.telemetry);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let query = if args.is_empty() {
        DEMO_QUERY.to_string()
    } else {
        args.join(" ")
    };

    let dispatcher = Dispatcher::from_config(&config).await?;

    println!("\n{}", "=".repeat(50));
    println!("QUERY: {}", query);

    let output = dispatcher.dispatch(&query).await?;
    println!("{}", render_console(&output));

    Ok(())
}
