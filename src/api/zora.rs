//! Zora coins REST client
//!
//! Thin wrapper over the public coins API used for profile lookup, the
//! "most valuable creators" explore list, holder balances and swap activity.
//! Records inside list responses are decoded one by one so a single bad node
//! never fails a whole page.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::CoinDataSource;
use crate::config::Config;
use crate::error::DashboardError;

const API_KEY_HEADER: &str = "api-key";
const MOST_VALUABLE_CREATORS: &str = "MOST_VALUABLE_CREATORS";

// ============================================================================
// Wire Schema
// ============================================================================

/// A numeric field the API sends either as a JSON number or a decimal string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(serde_json::Number),
    Text(String),
}

impl RawNumber {
    pub fn as_text(&self) -> String {
        match self {
            RawNumber::Number(n) => n.to_string(),
            RawNumber::Text(s) => s.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPreviewImage {
    pub small: Option<String>,
    pub medium: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAvatar {
    pub preview_image: Option<RawPreviewImage>,
}

impl RawAvatar {
    pub fn medium_url(&self) -> Option<String> {
        self.preview_image.as_ref().and_then(|p| p.medium.clone().or_else(|| p.small.clone()))
    }
}

/// Profile fragment embedded in coins, balances and swaps.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProfileRef {
    pub handle: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<RawAvatar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTokenPrice {
    pub price_in_usdc: Option<RawNumber>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCoin {
    pub address: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub total_supply: Option<RawNumber>,
    pub market_cap: Option<RawNumber>,
    pub market_cap_delta_24h: Option<RawNumber>,
    pub volume_24h: Option<RawNumber>,
    pub total_volume: Option<RawNumber>,
    pub unique_holders: Option<RawNumber>,
    pub created_at: Option<String>,
    pub creator_address: Option<String>,
    pub creator_profile: Option<RawProfileRef>,
    pub token_price: Option<RawTokenPrice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWallet {
    pub wallet_address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProfileCoin {
    pub address: Option<String>,
    pub market_cap: Option<RawNumber>,
    pub market_cap_delta_24h: Option<RawNumber>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProfile {
    pub handle: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<RawAvatar>,
    pub public_wallet: Option<RawWallet>,
    pub creator_coin: Option<RawProfileCoin>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBalance {
    /// Base units, 18 decimals.
    pub balance: Option<RawNumber>,
    pub owner_address: Option<String>,
    pub owner_profile: Option<RawProfileRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSwapPrice {
    pub price_usdc: Option<RawNumber>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSwap {
    pub activity_type: Option<String>,
    /// Base units, 18 decimals.
    pub coin_amount: Option<RawNumber>,
    pub sender_address: Option<String>,
    pub sender_profile: Option<RawProfileRef>,
    pub block_timestamp: Option<String>,
    pub transaction_hash: Option<String>,
    pub currency_amount_with_price: Option<RawSwapPrice>,
}

// --- Response envelopes ---

#[derive(Debug, Deserialize)]
struct Connection {
    #[serde(default)]
    edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
struct Edge {
    #[serde(default)]
    node: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExploreResponse {
    explore_list: Option<Connection>,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    profile: Option<RawProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinResponse {
    zora20_token: Option<RawCoin>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HoldersToken {
    token_balances: Option<Connection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HoldersResponse {
    zora20_token: Option<HoldersToken>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapsToken {
    swap_activities: Option<Connection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapsResponse {
    zora20_token: Option<SwapsToken>,
}

/// Decodes each edge node independently, skipping the ones that do not match `T`.
fn decode_nodes<T: DeserializeOwned>(connection: Option<Connection>, what: &str) -> Vec<T> {
    let edges = connection.map(|c| c.edges).unwrap_or_default();
    let mut out = Vec::with_capacity(edges.len());

    for (index, edge) in edges.into_iter().enumerate() {
        if edge.node.is_null() {
            debug!("Skipping empty {} node at position {}", what, index);
            continue;
        }
        match serde_json::from_value::<T>(edge.node) {
            Ok(node) => out.push(node),
            Err(e) => warn!("Skipping malformed {} node at position {}: {}", what, index, e),
        }
    }

    out
}

// ============================================================================
// Zora Client
// ============================================================================

#[derive(Debug, Clone)]
pub struct ZoraClient {
    base_url: String,
    api_key: Option<String>,
    chain_id: u64,
    client: Client,
}

impl ZoraClient {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        chain_id: u64,
        timeout: Duration,
    ) -> Result<Self, DashboardError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashboardError::Config(format!("Failed to create HTTP client for Zora: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
            chain_id,
            client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, DashboardError> {
        Self::new(
            &config.zora_api_url,
            config.zora_api_key.as_deref(),
            config.chain_id,
            config.http_timeout(),
        )
    }

    /// GETs `path` and decodes the body. Non-success statuses are logged and yield `None`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching {} from Zora: {:?}", url, query);

        let mut request = self.client.get(&url).header("Accept", "application/json").query(query);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to Zora {}", path))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Zora API rate limited on {} - set ZORA_API_KEY for higher limits", path);
            return Ok(None);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Zora API error on {}: {} - {}", path, status, error_text);
            return Ok(None);
        }

        let body = response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse Zora {} response", path))?;

        Ok(Some(body))
    }
}

#[async_trait]
impl CoinDataSource for ZoraClient {
    async fn get_profile(&self, identifier: &str) -> Result<Option<RawProfile>> {
        let response: Option<ProfileResponse> = self
            .get_json("/profile", &[("identifier", identifier.to_string())])
            .await?;
        Ok(response.and_then(|r| r.profile))
    }

    async fn get_coin(&self, address: &str) -> Result<Option<RawCoin>> {
        let response: Option<CoinResponse> = self
            .get_json(
                "/coin",
                &[("address", address.to_string()), ("chain", self.chain_id.to_string())],
            )
            .await?;
        Ok(response.and_then(|r| r.zora20_token))
    }

    async fn list_most_valuable_creators(&self, count: u32) -> Result<Vec<RawCoin>> {
        let response: Option<ExploreResponse> = self
            .get_json(
                "/explore",
                &[("listType", MOST_VALUABLE_CREATORS.to_string()), ("count", count.to_string())],
            )
            .await?;
        Ok(decode_nodes(response.and_then(|r| r.explore_list), "explore"))
    }

    async fn list_holders(&self, address: &str, count: u32) -> Result<Vec<RawBalance>> {
        let response: Option<HoldersResponse> = self
            .get_json(
                "/coinHolders",
                &[
                    ("address", address.to_string()),
                    ("chainId", self.chain_id.to_string()),
                    ("count", count.to_string()),
                ],
            )
            .await?;
        let balances = response.and_then(|r| r.zora20_token).and_then(|t| t.token_balances);
        Ok(decode_nodes(balances, "holder"))
    }

    async fn list_swaps(&self, address: &str, count: u32) -> Result<Vec<RawSwap>> {
        let response: Option<SwapsResponse> = self
            .get_json(
                "/coinSwaps",
                &[
                    ("address", address.to_string()),
                    ("chain", self.chain_id.to_string()),
                    ("first", count.to_string()),
                ],
            )
            .await?;
        let swaps = response.and_then(|r| r.zora20_token).and_then(|t| t.swap_activities);
        Ok(decode_nodes(swaps, "swap"))
    }
}
