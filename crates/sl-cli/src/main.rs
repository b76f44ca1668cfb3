use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sl_cli::commands::action::{self, Action};
use sl_cli::commands::{agenda, show_config, watch};
use sl_cli::{Cli, Commands, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = io::stdout();
    match command {
        Commands::Agenda { exhibition, json } => {
            let backend = Arc::new(config.client()?);
            agenda::run(&mut stdout, backend, &config, exhibition, *json).await?;
        }
        Commands::CheckIn {
            booking,
            exhibition,
        } => {
            let backend = Arc::new(config.client()?);
            action::run(
                &mut stdout,
                backend,
                &config,
                exhibition,
                booking,
                Action::CheckIn,
            )
            .await?;
        }
        Commands::Cancel {
            booking,
            exhibition,
        } => {
            let backend = Arc::new(config.client()?);
            action::run(
                &mut stdout,
                backend,
                &config,
                exhibition,
                booking,
                Action::Cancel,
            )
            .await?;
        }
        Commands::Watch { exhibition } => {
            let backend = Arc::new(config.client()?);
            watch::run(backend, &config, exhibition).await?;
        }
        Commands::Config => show_config::run(&mut stdout, &config)?,
    }

    Ok(())
}
