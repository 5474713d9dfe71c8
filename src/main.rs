//! taskboard
//!
//! Personal task tracker: an RPC server over SQLite and a CLI client that
//! applies changes optimistically.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use taskboard::cli::{Cli, Command, commands};
use taskboard::config::{Config, ConfigLoader};
use taskboard::db::Database;
use taskboard::logging;
use taskboard::server::start_server;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log, cli.verbose)?;

    // If explicit config path given, set it as env var for ConfigLoader to pick up
    if let Some(config_path) = &cli.config {
        // SAFETY: set before the runtime spawns any task that reads the environment
        unsafe {
            std::env::set_var("TASKBOARD_CONFIG_PATH", config_path);
        }
    }
    let mut loader = ConfigLoader::load()?;
    if let Some(path) = loader.config_path() {
        info!("Using config {}", path.display());
    }

    // CLI overrides
    let config = loader.config_mut();
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.into();
    }
    if let Some(server_url) = &cli.server {
        config.client.server_url = server_url.clone();
    }
    let mut config = loader.into_config();

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await
        }
        command => {
            let coordinator = commands::connect(&config.client).await?;
            for line in commands::run(&coordinator, command).await? {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

async fn run_server(config: Config) -> Result<()> {
    let db_path = &config.server.db_path;
    let db = Arc::new(Database::open(db_path)?);
    info!("Opened database {}", db_path.display());

    let handle = start_server(db, &config.server.host, config.server.port).await?;
    info!("Listening on {}", handle.url());

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
    handle.shutdown().await;
    Ok(())
}
