mod cli;
mod shell;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use file_catalog::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli_args = cli::Cli::parse();
    let store = cli_args.config_store();
    let config = store.load().unwrap_or_else(|e| {
        tracing::warn!("Could not load config, using defaults: {}", e);
        AppConfig::default()
    });

    cli::run(cli_args.command, config, store).await
}
