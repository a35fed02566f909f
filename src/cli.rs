use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bid-calculator", version, about = "Vehicle bid fee calculator")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the HTTP server (default)
    Start,

    /// Validate configuration and the fee schedule in the database
    Test,

    /// Calculate fees for a single bid and print the breakdown
    Calculate {
        /// Vehicle price
        #[arg(short, long, allow_negative_numbers = true)]
        price: String,

        /// Vehicle type
        #[arg(short = 't', long = "type", default_value = "common")]
        vehicle_type: String,

        /// Read fees from a TOML catalog instead of the database
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

impl Cli {
    /// Get the command to execute, defaulting to Start if none specified
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_start() {
        let cli = Cli::parse_from(["bid-calculator"]);
        assert!(matches!(cli.get_command(), Commands::Start));
        assert_eq!(cli.config, PathBuf::from("config.toml"));
    }

    #[test]
    fn test_calculate_arguments() {
        let cli = Cli::parse_from([
            "bid-calculator",
            "calculate",
            "--price",
            "1000.50",
            "--type",
            "luxury",
            "--catalog",
            "fees.toml",
        ]);

        match cli.get_command() {
            Commands::Calculate {
                price,
                vehicle_type,
                catalog,
                json,
            } => {
                assert_eq!(price, "1000.50");
                assert_eq!(vehicle_type, "luxury");
                assert_eq!(catalog, Some(PathBuf::from("fees.toml")));
                assert!(!json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_calculate_accepts_negative_price() {
        let cli = Cli::parse_from(["bid-calculator", "calculate", "--price", "-5"]);
        assert!(matches!(
            cli.get_command(),
            Commands::Calculate { ref price, .. } if price == "-5"
        ));
    }

    #[test]
    fn test_global_config_flag_after_subcommand() {
        let cli = Cli::parse_from(["bid-calculator", "test", "--config", "/etc/bid.toml"]);
        assert!(matches!(cli.get_command(), Commands::Test));
        assert_eq!(cli.config, PathBuf::from("/etc/bid.toml"));
    }
}
