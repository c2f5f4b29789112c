//! Metacanvas CLI - Extract schema-driven metadata from free text.

use anyhow::Context;
use clap::Parser;
use metacanvas_cli::commands;
use metacanvas_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the result
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let mut config = Config::load_from(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    config.apply_overrides(|name| std::env::var(name).ok());

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let schema_dir = cli.schema_dir.unwrap_or_else(|| config.schema_dir.clone());

    match cli.command {
        Command::Extract(args) => {
            commands::execute_extract(args, &config, schema_dir, &formatter)
                .await
                .context("Extraction failed")?;
        }
        Command::Schemas => {
            commands::execute_schemas(&config, schema_dir, &formatter)?;
        }
        Command::Config(args) => {
            commands::execute_config(args, &config, &config_path, &formatter)?;
        }
    }

    Ok(())
}
