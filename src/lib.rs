pub mod cli;
pub mod coordinator;
pub mod core;
pub mod fetcher;
pub mod metrics;
pub mod providers;

use crate::core::config::AppConfig;
use crate::fetcher::BalanceFetcher;
use crate::providers::BitcoinDeClient;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Refresh once and print the metrics
    Balance { json: bool },
    /// Refresh on the configured interval until interrupted
    Watch { json: bool },
}

/// Builds the balance fetcher for the account described by `config`.
pub fn build_fetcher(config: &AppConfig) -> Result<BalanceFetcher> {
    let client = BitcoinDeClient::new(
        config.base_url(),
        config.credentials(),
        config.request_timeout(),
    )
    .context("Failed to create bitcoin.de client")?;
    Ok(BalanceFetcher::from_client(client))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("bdtrack starting...");

    let config_path = match config_path {
        Some(path) => PathBuf::from(path),
        None => AppConfig::default_config_path()?,
    };
    let config = AppConfig::load_from_path(&config_path)?;
    debug!("Loaded config: {config:#?}");

    let fetcher = build_fetcher(&config)?;

    match command {
        AppCommand::Balance { json } => cli::balance::run(&config, &fetcher, json).await,
        AppCommand::Watch { json } => {
            cli::watch::run(&config, &config_path, Arc::new(fetcher), json).await
        }
    }
}
