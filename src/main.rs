use anyhow::Result;
use clap::Parser;
use std::path::Path;

mod cli;
mod commands;

use bid_calculator::{config, init_tracing};

/// Load configuration and initialize tracing from it
fn setup(path: &Path) -> Result<config::Config> {
    let cfg = config::load_config(path)?;
    init_tracing(&cfg.server);
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    match args.get_command() {
        cli::Commands::Start => {
            let cfg = setup(&args.config)?;
            commands::start::execute(cfg).await?;
        }
        cli::Commands::Test => {
            let cfg = setup(&args.config)?;
            commands::test::execute(&cfg).await?;
        }
        cli::Commands::Calculate {
            price,
            vehicle_type,
            catalog,
            json,
        } => {
            let cfg = setup(&args.config)?;
            commands::calculate::execute(&cfg, &price, &vehicle_type, catalog, json).await?;
        }
        cli::Commands::Version => {
            println!("Bid Calculator v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
