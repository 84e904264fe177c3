//! Binary for the whitelist application portal.

use anyhow::Result;
use clap::Parser;
use portal_server::{load_config, run_server, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { bind } => {
            let config = load_config(bind)?;
            run_server(config).await
        }
    }
}
