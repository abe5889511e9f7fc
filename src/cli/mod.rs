//! CLI module for PMP Semantic Cache
//!
//! - `serve`: HTTP server with the expiry sweeper
//! - `ask`: resolve one prompt and exit

pub mod ask;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// PMP Semantic Cache - semantic response cache and retrieval for local inference
#[derive(Parser)]
#[command(name = "pmp-semantic-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve,

    /// Resolve a single prompt through the cache
    Ask(ask::AskArgs),
}

/// Load `.env`, configuration and logging shared by every command
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging)?;

    Ok(config)
}
