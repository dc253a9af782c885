//! Gramophone - Main entry point.

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gramophone::{
    ChangelogService,
    cli::{Cli, run_changelog_command},
    config::Config,
    history,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{}", e))?;
    let backend = history::connect(&config.database).await?;

    // Schema creation happens here, once, and nowhere else.
    backend.initialize().await?;

    let service = ChangelogService::new(backend);
    let result = run_changelog_command(cli.command, &service).await;
    service.close().await;
    result
}
