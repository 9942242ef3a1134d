//! zakatek entry point.
//!
//! Logs go to stderr as JSON; response bodies and listings go to stdout.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use zakatek_core::{AppConfig, ConfigError};

mod cli;
mod commands;
mod host;

use cli::{Cli, Commands};
use host::Host;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(err) = err.downcast_ref::<zakatek_core::Error>() {
        return err.exit_code();
    }
    if err.is::<ConfigError>() {
        return 2;
    }
    1
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::load_from(Some(path))?,
        None => AppConfig::load()?,
    };
    tracing::debug!(generation = %config.generation, origin = %config.origin, "configuration loaded");

    let host = Host::build(config, cli.in_memory, cli.offline).await?;

    match cli.command {
        Commands::Install => commands::lifecycle::install(&host).await,
        Commands::Activate => commands::lifecycle::activate(&host).await,
        Commands::Update => commands::lifecycle::update(&host).await,
        Commands::Fetch { locator, navigate, method, output } => {
            commands::fetch::fetch(&host, &locator, navigate, &method, output.as_deref()).await
        }
        Commands::Generations { json } => commands::inspect::generations(&host, json).await,
        Commands::Entries { generation, json } => commands::inspect::entries(&host, generation.as_deref(), json).await,
    }
}
