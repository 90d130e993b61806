//! CLI module for rxwatch
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `watch` - Live operator dashboard (interactive)
//! - `search` - One-shot look-alike search
//! - `analytics` - Fetch and print all analytics slices
//! - `health` - Check backend health
//! - `config` - Configuration utilities (init)
//!
//! # Example
//!
//! ```bash
//! # Watch a local backend without the push channel
//! rxwatch watch --backend-url http://localhost:8000 --no-stream
//!
//! # Only critical look-alikes, as JSON
//! rxwatch search metformin --filter critical --json
//! ```

pub mod analytics;
pub mod config;
pub mod health;
pub mod output;
pub mod search;
pub mod watch;

pub use config::handle_config_init;

use crate::config::RxwatchConfig;
use crate::risk::CategoryFilter;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// rxwatch - medication name confusion-risk console
#[derive(Parser, Debug)]
#[command(
    name = "rxwatch",
    version,
    about = "Live operator console for a medication name confusion-risk service"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the live dashboard
    Watch(WatchArgs),
    /// Search look-alike drugs once and print the results
    Search(SearchArgs),
    /// Fetch analytics once and print them
    Analytics(AnalyticsArgs),
    /// Check backend health
    Health(HealthArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Options shared by every command that talks to the backend.
#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "rxwatch.toml")]
    pub config: PathBuf,

    /// Override the backend base URL
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// Do not open the push channel
    #[arg(long)]
    pub no_stream: bool,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Drug name to search
    pub drug: String,

    /// Only show one category (all, critical, high, medium, low)
    #[arg(short, long, default_value = "all")]
    pub filter: CategoryFilter,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub connect: ConnectArgs,
}

#[derive(Args, Debug)]
pub struct AnalyticsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub connect: ConnectArgs,
}

#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub connect: ConnectArgs,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "rxwatch.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,

    /// Backend base URL to write instead of the local default
    #[arg(long, value_name = "URL")]
    pub backend_url: Option<String>,
}

/// Load configuration with CLI overrides
///
/// A missing file at the default path falls back to defaults; environment
/// overrides apply on top of the file and CLI flags on top of both.
pub fn load_config_with_overrides(
    args: &ConnectArgs,
) -> Result<RxwatchConfig, Box<dyn std::error::Error>> {
    let mut config = if args.config.exists() {
        RxwatchConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        RxwatchConfig::default()
    };

    config = config.with_env_overrides();

    if let Some(ref url) = args.backend_url {
        config.backend.base_url = url.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    Ok(config)
}
