//! setk CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;

use setk::cli::{Cli, Commands};
use setk::domain::models::Config;
use setk::infrastructure::config::ConfigLoader;
use setk::infrastructure::logging::{LogConfig, LoggerImpl};

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    if let Some(model) = &cli.model {
        config.model.clone_from(model);
        ConfigLoader::validate(&config).context("Invalid --model")?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => setk::cli::handle_error(err, cli.json),
    };

    // Held until exit so buffered file logs flush.
    let logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("warning: logging disabled: {err:#}");
            None
        }
    };

    let result = match cli.command {
        Commands::Init(args) => setk::cli::commands::init::execute(args, cli.json),
        Commands::Generate(args) => {
            setk::cli::commands::generate::execute(args, config, cli.json).await
        }
        Commands::Batch(args) => setk::cli::commands::batch::execute(args, config, cli.json).await,
        Commands::Examples(args) => {
            setk::cli::commands::examples::execute(args, config, cli.json).await
        }
    };

    if let Err(err) = result {
        drop(logger);
        setk::cli::handle_error(err, cli.json);
    }
}
