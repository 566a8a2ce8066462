//! Marketview - browse the reconciled marketplace listing.
//!
//! This is the command-line entry point, which:
//! - Loads configuration from TOML
//! - Lists one page of the reconciled catalog
//! - Follows push notifications and reprints the listing as it changes

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use marketview_engine::config::MarketviewConfig;
use marketview_engine::marketplace::{self, MarketplaceCommand};

/// Marketview - reconciled marketplace listing
#[derive(Parser, Debug)]
#[command(name = "marketview")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Run in verbose mode (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: MarketplaceCommand,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match MarketviewConfig::locate(args.config.as_deref()) {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            MarketviewConfig::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => {
            debug!("No configuration file found, using defaults");
            MarketviewConfig::default()
        }
    };

    marketplace::execute(args.command, &config).await
}
