use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod dashboard;
mod error;
mod market;
mod models;
mod web;

use crate::api::ZoraClient;
use crate::config::Config;
use crate::dashboard::Board;
use crate::market::CoinService;
use crate::web::AppState;

#[derive(Debug, Parser)]
#[command(name = "creatorboard", version, about = "Live leaderboard for Zora creator coins")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the JSON query API (default)
    Serve,
    /// Poll and display the creator coin leaderboard
    Leaderboard {
        /// Show the 24h gainers board instead of top creators by market cap
        #[arg(long)]
        gainers: bool,
        /// Print one snapshot and exit
        #[arg(long)]
        once: bool,
    },
    /// Poll and display one creator coin
    Coin {
        /// Wallet address, coin address or @handle
        identifier: String,
        #[arg(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve);

    // The dashboard owns stdout, so logs go to stderr and stay quiet by default
    let default_level = match command {
        Command::Serve => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;
    info!("Configuration loaded successfully");

    match command {
        Command::Serve => serve(config).await,
        Command::Leaderboard { gainers, once } => {
            let board = if gainers { Board::TopGainers } else { Board::TopCreators };
            dashboard::run_leaderboard(&config, board, once).await
        }
        Command::Coin { identifier, once } => dashboard::run_coin(&config, &identifier, once).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    let zora = ZoraClient::from_config(&config)?;
    if config.zora_api_key.is_none() {
        info!("ZORA_API_KEY not set, using anonymous rate limits");
    }
    info!("Zora client initialized for chain {}", config.chain_id);

    let coin_service = Arc::new(CoinService::new(Arc::new(zora)));
    let state = AppState::new(coin_service, Arc::new(config));

    info!("Starting CreatorBoard API...");
    web::server::start_server(state).await
}
