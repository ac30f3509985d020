use anyhow::Context;
use clap::Parser;
use skillet::{AppState, BusClient, HandlerRegistry, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Message-bus LLM handler service.
#[derive(Parser, Debug)]
#[command(name = "skillet", version, about)]
struct Cli {
    /// Path to the configuration file (defaults to the standard locations).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let state = AppState::from_settings(settings).context("failed to build application state")?;
    let registry = Arc::new(HandlerRegistry::with_default_handlers(&state));

    let bus = BusClient::connect(&state.settings.bus, registry)
        .await
        .context("failed to connect to the message bus")?;

    bus.run().await.context("bus client terminated")?;
    Ok(())
}
