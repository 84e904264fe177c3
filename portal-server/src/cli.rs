//! CLI parser and config loading.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::PortalConfig;

#[derive(Parser)]
#[command(name = "whitelist-portal")]
#[command(about = "Whitelist application portal", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the portal (config from env; bind can override BIND_ADDR).
    Run {
        #[arg(short, long)]
        bind: Option<String>,
    },
}

/// Load PortalConfig from environment. If `bind` is provided it overrides BIND_ADDR.
pub fn load_config(bind: Option<String>) -> Result<PortalConfig> {
    PortalConfig::load(bind)
}
