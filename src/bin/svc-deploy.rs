use anyhow::{Context, Result};
use clap::Parser;
use svc_deploy::cli::{load_config, run_command, SvcDeployCli};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = SvcDeployCli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    info!("Starting svc-deploy v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    run_command(&cli, &config).await?;

    Ok(())
}
