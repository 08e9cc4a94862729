//! Creator coin aggregation service
//!
//! The only component that talks to the coin data API. Upstream failures are
//! caught here, logged, and turned into empty results so that one failing call
//! never fails a whole page; only bad caller input escapes as an error.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::{CoinDataSource, RawCoin};
use crate::error::DashboardError;
use crate::market::normalize::{
    estimate_supply, normalize_coin, normalize_holder, normalize_swap, profile_summary,
    ValidationMode,
};
use crate::models::{ActivityEvent, CoinLookup, CreatorCoin, Holder, SupplySource};

const MAX_IDENTIFIER_LEN: usize = 128;

/// Upstream fetch sizes and output caps.
#[derive(Debug, Clone)]
pub struct ServiceLimits {
    /// Leaderboard entries fetched per listing (and scanned by the lookup fallback).
    pub leaderboard_fetch: u32,
    pub top_creators: usize,
    pub top_gainers: usize,
    pub holders: u32,
    pub activity: u32,
}

impl Default for ServiceLimits {
    fn default() -> Self {
        Self {
            leaderboard_fetch: 200,
            top_creators: 100,
            top_gainers: 200,
            holders: 20,
            activity: 50,
        }
    }
}

/// Holder list plus the provenance of the supply used for percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct HolderBreakdown {
    pub holders: Vec<Holder>,
    pub supply_source: SupplySource,
}

/// Outcome of one entry of a batch lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub identifier: String,
    pub creator_coin: Option<CreatorCoin>,
    pub error: Option<String>,
}

pub struct CoinService {
    source: Arc<dyn CoinDataSource>,
    limits: ServiceLimits,
}

/// Trims an identifier and checks it is usable. Returns the trimmed form.
pub fn validate_identifier(identifier: &str) -> Result<&str, DashboardError> {
    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        return Err(DashboardError::InvalidIdentifier("identifier is empty".to_string()));
    }
    if trimmed.len() > MAX_IDENTIFIER_LEN {
        return Err(DashboardError::InvalidIdentifier(format!(
            "identifier longer than {} characters",
            MAX_IDENTIFIER_LEN
        )));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(DashboardError::InvalidIdentifier(format!(
            "identifier {:?} contains whitespace",
            trimmed
        )));
    }
    Ok(trimmed)
}

impl CoinService {
    pub fn new(source: Arc<dyn CoinDataSource>) -> Self {
        Self::with_limits(source, ServiceLimits::default())
    }

    pub fn with_limits(source: Arc<dyn CoinDataSource>, limits: ServiceLimits) -> Self {
        Self { source, limits }
    }

    /// Resolves a wallet address or `@handle` to its creator coin.
    ///
    /// Looks the profile up first; if it carries no creator coin (or the coin
    /// cannot be loaded) the leaderboard is scanned for a matching address.
    pub async fn get_coin(&self, identifier: &str) -> Result<CoinLookup, DashboardError> {
        let identifier = validate_identifier(identifier)?;
        let lookup_key = identifier.trim_start_matches('@');

        let raw_profile = match self.source.get_profile(lookup_key).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Profile lookup failed for {}: {:#}", identifier, e);
                None
            }
        };
        let profile = raw_profile.as_ref().map(profile_summary);

        if let Some(address) = profile.as_ref().and_then(|p| p.creator_coin_address.clone()) {
            match self.source.get_coin(&address).await {
                Ok(Some(raw)) => match normalize_coin(&raw, ValidationMode::Detail) {
                    Ok(coin) => {
                        return Ok(CoinLookup { profile, creator_coin: Some(coin) });
                    }
                    Err(reason) => warn!("Dropping creator coin {}: {}", address, reason),
                },
                Ok(None) => debug!("Coin {} not returned by upstream", address),
                Err(e) => warn!("Coin lookup failed for {}: {:#}", address, e),
            }
        }

        let target = profile
            .as_ref()
            .and_then(|p| p.creator_coin_address.clone())
            .unwrap_or_else(|| lookup_key.to_string());

        let creator_coin = self
            .fetch_leaderboard()
            .await
            .iter()
            .find(|raw| matches_identifier(raw, &target))
            .and_then(|raw| match normalize_coin(raw, ValidationMode::Detail) {
                Ok(coin) => Some(coin),
                Err(reason) => {
                    warn!("Dropping leaderboard match for {}: {}", target, reason);
                    None
                }
            });

        if creator_coin.is_none() {
            debug!("No creator coin found for {}", identifier);
        }

        Ok(CoinLookup { profile, creator_coin })
    }

    /// Looks identifiers up one at a time, in order. A failed entry carries its
    /// own error and never aborts the rest.
    pub async fn get_coins_batch(&self, identifiers: &[String]) -> Vec<BatchEntry> {
        let mut out = Vec::with_capacity(identifiers.len());

        for identifier in identifiers {
            let entry = match self.get_coin(identifier).await {
                Ok(lookup) => BatchEntry {
                    identifier: identifier.clone(),
                    creator_coin: lookup.creator_coin,
                    error: None,
                },
                Err(e) => BatchEntry {
                    identifier: identifier.clone(),
                    creator_coin: None,
                    error: Some(e.to_string()),
                },
            };
            out.push(entry);
        }

        out
    }

    /// Valid creator coins by market cap, largest first.
    pub async fn list_top_creators(&self) -> Vec<CreatorCoin> {
        let mut coins = self.valid_leaderboard().await;
        coins.sort_by(|a, b| b.market_cap.cmp(&a.market_cap));
        coins.truncate(self.limits.top_creators);
        info!("Serving {} top creators", coins.len());
        coins
    }

    /// Valid creator coins by 24h change relative to market cap, largest first.
    pub async fn list_top_gainers(&self) -> Vec<CreatorCoin> {
        // market_cap > 0 is guaranteed by validation, so the ratio is always defined
        let mut coins = self.valid_leaderboard().await;
        coins.sort_by(|a, b| b.change_ratio().cmp(&a.change_ratio()));
        coins.truncate(self.limits.top_gainers);
        info!("Serving {} top gainers", coins.len());
        coins
    }

    pub async fn get_holders(&self, coin_address: &str) -> Result<HolderBreakdown, DashboardError> {
        let address = validate_identifier(coin_address)?;

        let coin = match self.source.get_coin(address).await {
            Ok(coin) => coin,
            Err(e) => {
                warn!("Coin lookup for holder supply failed for {}: {:#}", address, e);
                None
            }
        };
        let (supply, supply_source) = estimate_supply(coin.as_ref());
        if supply_source == SupplySource::Derived {
            debug!("Holder percentages for {} use supply derived from marketCap / price", address);
        }

        let balances = match self.source.list_holders(address, self.limits.holders).await {
            Ok(balances) => balances,
            Err(e) => {
                warn!("Holder listing failed for {}: {:#}", address, e);
                Vec::new()
            }
        };

        let holders = balances
            .iter()
            .enumerate()
            .filter_map(|(position, raw)| match normalize_holder(position, raw, supply) {
                Ok(holder) => Some(holder),
                Err(reason) => {
                    warn!("Dropping holder #{} of {}: {}", position, address, reason);
                    None
                }
            })
            .collect();

        Ok(HolderBreakdown { holders, supply_source })
    }

    pub async fn get_recent_activity(
        &self,
        coin_address: &str,
    ) -> Result<Vec<ActivityEvent>, DashboardError> {
        let address = validate_identifier(coin_address)?;

        let swaps = match self.source.list_swaps(address, self.limits.activity).await {
            Ok(swaps) => swaps,
            Err(e) => {
                warn!("Swap listing failed for {}: {:#}", address, e);
                Vec::new()
            }
        };

        let now = Utc::now();
        Ok(swaps
            .iter()
            .filter_map(|raw| match normalize_swap(raw, now) {
                Ok(event) => Some(event),
                Err(reason) => {
                    warn!("Dropping swap of {}: {}", address, reason);
                    None
                }
            })
            .collect())
    }

    async fn fetch_leaderboard(&self) -> Vec<RawCoin> {
        match self
            .source
            .list_most_valuable_creators(self.limits.leaderboard_fetch)
            .await
        {
            Ok(coins) => coins,
            Err(e) => {
                warn!("Failed to fetch creator leaderboard: {:#}", e);
                Vec::new()
            }
        }
    }

    async fn valid_leaderboard(&self) -> Vec<CreatorCoin> {
        let raw = self.fetch_leaderboard().await;
        let total = raw.len();

        let coins: Vec<CreatorCoin> = raw
            .iter()
            .filter_map(|coin| match normalize_coin(coin, ValidationMode::Listing) {
                Ok(coin) => Some(coin),
                Err(reason) => {
                    debug!("Dropping leaderboard entry {:?}: {}", coin.address, reason);
                    None
                }
            })
            .collect();

        if coins.len() < total {
            debug!("{} of {} leaderboard entries failed validation", total - coins.len(), total);
        }
        coins
    }
}

fn matches_identifier(raw: &RawCoin, target: &str) -> bool {
    let eq = |value: &Option<String>| {
        value
            .as_deref()
            .map(|v| v.eq_ignore_ascii_case(target))
            .unwrap_or(false)
    };

    eq(&raw.address)
        || eq(&raw.creator_address)
        || raw
            .creator_profile
            .as_ref()
            .map(|p| eq(&p.handle))
            .unwrap_or(false)
}

#[cfg(test)]
pub mod fake {
    //! In-memory data source for service and handler tests.

    use super::*;
    use crate::api::{RawBalance, RawProfile, RawSwap};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeSource {
        pub profiles: HashMap<String, RawProfile>,
        pub coins: HashMap<String, RawCoin>,
        pub leaderboard: Vec<RawCoin>,
        pub holders: Vec<RawBalance>,
        pub swaps: Vec<RawSwap>,
        /// Every call fails with a transport error.
        pub offline: bool,
        pub profile_calls: Mutex<Vec<String>>,
        pub leaderboard_calls: AtomicUsize,
    }

    impl FakeSource {
        fn check(&self) -> Result<()> {
            if self.offline {
                Err(anyhow!("connection refused"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl CoinDataSource for FakeSource {
        async fn get_profile(&self, identifier: &str) -> Result<Option<RawProfile>> {
            self.profile_calls.lock().unwrap().push(identifier.to_string());
            self.check()?;
            Ok(self.profiles.get(identifier).cloned())
        }

        async fn get_coin(&self, address: &str) -> Result<Option<RawCoin>> {
            self.check()?;
            Ok(self.coins.get(address).cloned())
        }

        async fn list_most_valuable_creators(&self, count: u32) -> Result<Vec<RawCoin>> {
            self.leaderboard_calls.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            Ok(self.leaderboard.iter().take(count as usize).cloned().collect())
        }

        async fn list_holders(&self, _address: &str, count: u32) -> Result<Vec<RawBalance>> {
            self.check()?;
            Ok(self.holders.iter().take(count as usize).cloned().collect())
        }

        async fn list_swaps(&self, _address: &str, count: u32) -> Result<Vec<RawSwap>> {
            self.check()?;
            Ok(self.swaps.iter().take(count as usize).cloned().collect())
        }
    }

    pub fn text(s: &str) -> crate::api::RawNumber {
        crate::api::RawNumber::Text(s.to_string())
    }

    /// A leaderboard record; `handle` of `None` makes it invalid for listings.
    pub fn coin(address: &str, handle: Option<&str>, market_cap: &str, delta: &str) -> RawCoin {
        use crate::api::zora::{RawProfileRef, RawTokenPrice};

        RawCoin {
            address: Some(address.to_string()),
            name: Some(format!("{} coin", address)),
            symbol: Some(address.trim_start_matches("0x").to_uppercase()),
            market_cap: Some(text(market_cap)),
            market_cap_delta_24h: Some(text(delta)),
            volume_24h: Some(text("10")),
            creator_address: Some(format!("{}-creator", address)),
            creator_profile: handle.map(|h| RawProfileRef {
                handle: Some(h.to_string()),
                ..Default::default()
            }),
            token_price: Some(RawTokenPrice { price_in_usdc: Some(text("0.01")) }),
            ..Default::default()
        }
    }
}
