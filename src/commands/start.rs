use anyhow::Result;
use bid_calculator::{config::Config, server};
use colored::Colorize;
use tracing::info;

/// Execute the start command
pub async fn execute(cfg: Config) -> Result<()> {
    println!("{}", "Starting bid calculator...".green());
    info!(
        host = %cfg.server.host,
        port = cfg.server.port,
        database = %cfg.database.url,
        "Configuration loaded"
    );

    server::start_server(cfg).await
}
