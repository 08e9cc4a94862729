use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_ZORA_API_URL: &str = "https://api-sdk.zora.engineering";
const DEFAULT_CHAIN_ID: u64 = 8453; // Base mainnet

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub zora_api_key: Option<String>, // Optional, enables higher rate limits
    pub zora_api_url: String,
    pub chain_id: u64,
    pub http_timeout_secs: u64,

    pub api_host: Option<String>,
    pub api_port: Option<u16>,

    pub dashboard: DashboardConfig,
}

/// Settings for the polling terminal dashboard.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DashboardConfig {
    pub server_url: String,
    pub leaderboard_poll_secs: u64,
    pub coin_poll_secs: u64,
    pub holders_poll_secs: u64,
    pub activity_poll_secs: u64,
    pub retry_count: u32,
    pub retry_delay_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:3000".to_string(),
            leaderboard_poll_secs: 10,
            coin_poll_secs: 10,
            holders_poll_secs: 60, // holder sets churn slower than prices
            activity_poll_secs: 30,
            retry_count: 3,
            retry_delay_secs: 5,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zora_api_key: None,
            zora_api_url: DEFAULT_ZORA_API_URL.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            http_timeout_secs: 20,
            api_host: None,
            api_port: None,
            dashboard: DashboardConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let defaults = DashboardConfig::default();

        Ok(Self {
            zora_api_key: env::var("ZORA_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            zora_api_url: env::var("ZORA_API_URL")
                .unwrap_or_else(|_| DEFAULT_ZORA_API_URL.to_string()),
            chain_id: parse_var("ZORA_CHAIN_ID", DEFAULT_CHAIN_ID)?,
            http_timeout_secs: parse_var("HTTP_TIMEOUT_SECS", 20)?,

            api_host: env::var("API_HOST").ok(),
            api_port: env::var("API_PORT")
                .ok()
                .map(|p| p.trim().parse::<u16>())
                .transpose()
                .context("Failed to parse API_PORT")?,

            dashboard: DashboardConfig {
                server_url: env::var("DASHBOARD_SERVER_URL").unwrap_or(defaults.server_url),
                leaderboard_poll_secs: parse_var("LEADERBOARD_POLL_SECS", defaults.leaderboard_poll_secs)?,
                coin_poll_secs: parse_var("COIN_POLL_SECS", defaults.coin_poll_secs)?,
                holders_poll_secs: parse_var("HOLDERS_POLL_SECS", defaults.holders_poll_secs)?,
                activity_poll_secs: parse_var("ACTIVITY_POLL_SECS", defaults.activity_poll_secs)?,
                retry_count: parse_var("POLL_RETRY_COUNT", defaults.retry_count)?,
                retry_delay_secs: parse_var("POLL_RETRY_DELAY_SECS", defaults.retry_delay_secs)?,
            },
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Reads an optional numeric variable. A present but unparsable value is an error.
fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Failed to parse {}", name)),
        Err(_) => Ok(default),
    }
}
