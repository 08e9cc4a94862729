//! HTTP client for the dashboard's own query API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::poller::Fetch;
use crate::error::DashboardError;
use crate::models::{ActivityEvent, CreatorCoin};
use crate::web::models::{CoinResponse, ErrorResponse, HoldersResponse, ItemsResponse};

/// Which leaderboard listing to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Board {
    TopCreators,
    TopGainers,
}

impl Board {
    fn path(self) -> &'static str {
        match self {
            Board::TopCreators => "/api/top-creators",
            Board::TopGainers => "/api/top-gainers",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Board::TopCreators => "Top Creator Coins",
            Board::TopGainers => "Top Gainers (24h)",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BoardClient {
    base_url: String,
    client: Client,
}

impl BoardClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DashboardError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashboardError::Config(format!("Failed to create dashboard HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Polling {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to reach dashboard server at {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error,
                Err(_) => status.to_string(),
            };
            return Err(DashboardError::Upstream(format!("{} returned {}: {}", path, status, message)).into());
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read {} response", path))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| DashboardError::Unexpected(format!("Malformed {} response: {}", path, e)).into())
    }

    pub async fn leaderboard(&self, board: Board) -> Result<Vec<CreatorCoin>> {
        let response: ItemsResponse<CreatorCoin> = self.get_json(board.path(), &[]).await?;
        Ok(response.items)
    }

    pub async fn coin(&self, identifier: &str) -> Result<CoinResponse> {
        self.get_json("/api/coin", &[("identifier", identifier)]).await
    }

    pub async fn holders(&self, address: &str) -> Result<HoldersResponse> {
        self.get_json("/api/coins/holders", &[("address", address)]).await
    }

    pub async fn activity(&self, address: &str) -> Result<Vec<ActivityEvent>> {
        let response: ItemsResponse<ActivityEvent> =
            self.get_json("/api/coins/activity", &[("address", address)]).await?;
        Ok(response.items)
    }
}

// ============================================================================
// Poll targets
// ============================================================================

pub struct LeaderboardFetch {
    pub client: BoardClient,
    pub board: Board,
}

#[async_trait]
impl Fetch for LeaderboardFetch {
    type Output = Vec<CreatorCoin>;

    async fn fetch(&self) -> Result<Self::Output> {
        self.client.leaderboard(self.board).await
    }
}

pub struct CoinFetch {
    pub client: BoardClient,
    pub identifier: String,
}

#[async_trait]
impl Fetch for CoinFetch {
    type Output = CoinResponse;

    async fn fetch(&self) -> Result<Self::Output> {
        self.client.coin(&self.identifier).await
    }
}

pub struct HoldersFetch {
    pub client: BoardClient,
    pub address: String,
}

#[async_trait]
impl Fetch for HoldersFetch {
    type Output = HoldersResponse;

    async fn fetch(&self) -> Result<Self::Output> {
        self.client.holders(&self.address).await
    }
}

pub struct ActivityFetch {
    pub client: BoardClient,
    pub address: String,
}

#[async_trait]
impl Fetch for ActivityFetch {
    type Output = Vec<ActivityEvent>;

    async fn fetch(&self) -> Result<Self::Output> {
        self.client.activity(&self.address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SupplySource;
    use mockito::Matcher;
    use rust_decimal_macros::dec;

    fn client_for(server: &mockito::Server) -> BoardClient {
        BoardClient::new(&server.url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_leaderboard_sends_no_cache_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/top-gainers")
            .match_header("cache-control", "no-cache")
            .match_header("pragma", "no-cache")
            .with_status(200)
            .with_body(
                r#"{"items":[{"address":"0x01","name":"One","symbol":"ONE","creatorHandle":"one",
                "marketCap":1000.5,"volume24h":10,"totalVolume":100,"price":0.25,
                "marketCapDelta24h":-20,"uniqueHolders":7,"createdAt":null}]}"#,
            )
            .create_async()
            .await;

        let coins = client_for(&server).leaderboard(Board::TopGainers).await.unwrap();
        mock.assert_async().await;

        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].market_cap, dec!(1000.5));
        assert_eq!(coins[0].market_cap_delta_24h, dec!(-20));
        assert_eq!(coins[0].unique_holders, 7);
    }

    #[tokio::test]
    async fn test_coin_not_found_is_null_coin() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/coin")
            .match_query(Matcher::UrlEncoded("identifier".into(), "@ghost".into()))
            .with_status(200)
            .with_body(r#"{"profile":null,"creatorCoin":null}"#)
            .create_async()
            .await;

        let response = client_for(&server).coin("@ghost").await.unwrap();
        assert!(response.profile.is_none());
        assert!(response.creator_coin.is_none());
    }

    #[tokio::test]
    async fn test_error_status_carries_server_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/coins/holders")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":"address is required"}"#)
            .create_async()
            .await;

        let err = client_for(&server).holders(" ").await.unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("400"));
        assert!(message.contains("address is required"));
        assert!(matches!(err.downcast_ref::<DashboardError>(), Some(DashboardError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_holders_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/coins/holders")
            .match_query(Matcher::UrlEncoded("address".into(), "0xcoin".into()))
            .with_status(200)
            .with_body(
                r#"{"items":[{"address":"0xpool","handle":"Market","balance":500,"percentage":50,
                "isMarket":true,"hasRealHandle":false}],"supplySource":"derived"}"#,
            )
            .create_async()
            .await;

        let response = client_for(&server).holders("0xcoin").await.unwrap();
        assert_eq!(response.supply_source, SupplySource::Derived);
        assert!(response.items[0].is_market);
        assert_eq!(response.items[0].percentage, dec!(50));
    }

    #[tokio::test]
    async fn test_malformed_body_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/coins/activity")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let err = client_for(&server).activity("0xcoin").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DashboardError>(), Some(DashboardError::Unexpected(_))));
    }
}
