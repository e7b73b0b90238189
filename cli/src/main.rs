mod cli;
mod commands;

use anyhow::Context;
use clap::Parser;
use log::info;
use tracing_subscriber::EnvFilter;

use audi::Config;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config = resolve_config(&cli)?;
    info!("Using data directory {}", config.data_dir.display());

    match cli.command {
        Commands::Process(args) => commands::process(&config, args).await,
        Commands::List { json } => commands::list(&config, json).await,
        Commands::Show { id, log, json } => commands::show(&config, &id, log, json).await,
        Commands::Delete { id, force } => commands::delete(&config, &id, force).await,
    }
}

/// `RUST_LOG` wins over the verbosity flag when set.
fn init_tracing(verbose: u8) -> anyhow::Result<()> {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_log::LogTracer::init().context("failed to bridge log records")?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;
    Ok(())
}

/// Config file (or defaults), then environment overrides, then `--data`.
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => audi::load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env_overrides();
    if let Some(data) = &cli.data {
        config.data_dir = data.clone();
    }
    audi::config::validate_config(&config)?;
    Ok(config)
}
