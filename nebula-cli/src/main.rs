//! # nebula
//!
//! Command-line front end for the cluster control plane. Each subcommand
//! maps onto one or two XML-RPC calls made through `nebula-client`.
//!
//! ## Usage
//! ```bash
//! nebula --endpoint http://frontend:2633/RPC2 vm list --scope mine
//! nebula cluster create my_cluster
//! nebula --json host show 3
//! ```

use anyhow::Result;
use clap::Parser;
use nebula_client::Client;
use tracing::{debug, error, info};

mod cli;
mod commands;
mod config;
mod output;

use cli::Args;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let (config, source) = Config::resolve(args.config.as_deref())?;
    let config = config.with_cli_overrides(&args);

    // Initialize logging
    if config.log.json {
        nebula_common::init_logging_json(&args.log_level)?;
    } else {
        nebula_common::init_logging(&args.log_level)?;
    }

    match source {
        Some(path) => info!(config_path = %path.display(), "Configuration loaded"),
        None => info!("No config file found, using environment, CLI arguments and defaults"),
    }

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        endpoint = %config.client.endpoint,
        "Starting nebula"
    );

    let client = Client::from_config(&config.client)?;

    if let Err(e) = commands::run(&client, args.command, args.json).await {
        error!(error = %e, "Command failed");
        return Err(e);
    }

    Ok(())
}
