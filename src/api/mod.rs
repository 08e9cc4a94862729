//! External creator-coin data API.
//!
//! Everything above this module sees the data API only through [`CoinDataSource`],
//! so handlers and the coin service can be exercised against an in-memory fake.

pub mod zora;

use anyhow::Result;
use async_trait::async_trait;

pub use zora::{RawBalance, RawCoin, RawNumber, RawProfile, RawSwap, ZoraClient};

/// Read-only access to profiles, the creator leaderboard, holder balances and swaps.
///
/// Implementations return `Ok(None)` / an empty list when the upstream answers with a
/// non-success status, and `Err` only for transport or decoding failures.
#[async_trait]
pub trait CoinDataSource: Send + Sync {
    async fn get_profile(&self, identifier: &str) -> Result<Option<RawProfile>>;

    async fn get_coin(&self, address: &str) -> Result<Option<RawCoin>>;

    /// Creator coins ordered by market value, as the upstream ranks them.
    async fn list_most_valuable_creators(&self, count: u32) -> Result<Vec<RawCoin>>;

    /// Largest balances first. The first entry is the market-maker position.
    async fn list_holders(&self, address: &str, count: u32) -> Result<Vec<RawBalance>>;

    /// Most recent swaps first.
    async fn list_swaps(&self, address: &str, count: u32) -> Result<Vec<RawSwap>>;
}
