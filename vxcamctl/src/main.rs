use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vxcamctl::cli::{Cli, Command};
use vxcamctl::commands;
use vxcamctl::config::ConfigLoader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::with_options(cli.loader_options())
        .with_overrides(cli.overrides())
        .load()
        .context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vxcam_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "using configuration file");
    }
    debug!(?config, "configuration resolved");

    match &cli.command {
        Command::Submit(args) => commands::submit::run(&config, args).await,
        Command::Preview(args) => commands::preview::run(&config, args).await,
        Command::Retime(args) => commands::retime::run(&config, args),
    }
}
