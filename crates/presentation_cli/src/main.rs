//! VoxBridge CLI

use anyhow::Context;
use clap::Parser;
use infrastructure::{AppConfig, bootstrap, init_logging};
use presentation_cli::{Cli, commands, log_filter_from_verbosity};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(filter) = log_filter_from_verbosity(cli.verbose) {
        config.logging.filter = filter.to_string();
    }
    init_logging(&config.logging)?;

    let service = bootstrap(&config).await?;
    commands::run(cli.command, &config, &service).await
}
