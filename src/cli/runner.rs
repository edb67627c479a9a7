//! CLI runner
//!
//! Wires config, catalog and state files into the engine. Messages go to
//! stdout; logs go to stderr so downstream targets see a clean stream.

use super::commands::{Cli, Commands};
use crate::catalog::{self, Catalog};
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::http::RechargeClient;
use crate::state::SyncState;
use crate::sync::{sync_all, JsonLineSink};
use std::path::Path;
use tracing::info;

/// Executes CLI commands
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a runner from parsed arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the selected command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Discover => self.do_discover().await,
            Commands::Sync { catalog, state } => {
                self.do_sync(catalog.as_deref(), state.as_deref()).await
            }
        }
    }

    async fn do_discover(&self) -> Result<()> {
        info!("Starting discover");

        // Discovery is offline, but when credentials are on hand verify them
        // so a bad token fails here rather than mid-run.
        if let Some(path) = &self.cli.config {
            let config = TapConfig::from_file(path)?;
            let client = RechargeClient::from_config(&config);
            client.check_access_token().await?;
        }

        let catalog = catalog::discover();
        println!("{}", catalog.to_json_pretty()?);

        info!("Finished discover");
        Ok(())
    }

    async fn do_sync(&self, catalog_path: Option<&Path>, state_path: Option<&Path>) -> Result<()> {
        let config_path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("--config is required for sync"))?;
        let config = TapConfig::from_file(config_path)?;

        let catalog = match catalog_path {
            Some(path) => Catalog::from_file(path)?,
            None => catalog::discover(),
        };

        let mut state = match state_path {
            Some(path) if path.exists() => SyncState::from_file(path)?,
            _ => SyncState::new(),
        };

        let client = RechargeClient::from_config(&config);
        let mut sink = JsonLineSink::stdout();

        sync_all(&client, &config, &catalog, &mut state, &mut sink).await?;
        Ok(())
    }
}
