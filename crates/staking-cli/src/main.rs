use clap::{Parser, Subcommand};
use eyre::Result;
use log::{debug, LevelFilter};

mod commands;
mod config;

use commands::*;
use config::Config;

#[derive(Parser)]
#[command(name = "staking-cli")]
#[command(about = "Staking protocol contract client")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<String>,

    /// RPC URL (overrides config)
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Environment file path
    #[arg(long, global = true, default_value = ".env")]
    env_file: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short = 'l', long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Reward intervals and claims
    Rewards {
        #[command(subcommand)]
        command: RewardsCommands,
    },
    /// Oracle DAO proposals and protocol settings
    Dao {
        #[command(subcommand)]
        command: DaoCommands,
    },
    /// Token balances and transfers
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

fn setup_logging(log_level: &str) {
    let log_level = match log_level {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .filter_module("alloy", LevelFilter::Warn)
        .parse_default_env()
        .format_timestamp(None)
        .init();
    debug!("Log level: {log_level}");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let config = Config::load(&cli.config, &cli.env_file)?;
    let config = if let Some(rpc_url) = cli.rpc_url {
        config.with_rpc_url(rpc_url)
    } else {
        config
    };

    match cli.command {
        Commands::Rewards { command } => handle_rewards_command(command, &config).await,
        Commands::Dao { command } => handle_dao_command(command, &config).await,
        Commands::Token { command } => handle_token_command(command, &config).await,
    }
}
