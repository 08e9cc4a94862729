//! Leaderboard view: client-side sorting and summary statistics.

use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::poller::Snapshot;
use crate::models::CreatorCoin;

const HIGHLIGHT_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    MarketCap,
    Volume24h,
    TotalVolume,
    /// 24h market cap change relative to market cap.
    Change24h,
    Price,
    UniqueHolders,
}

impl SortField {
    fn key(self, coin: &CreatorCoin) -> Decimal {
        match self {
            SortField::MarketCap => coin.market_cap,
            SortField::Volume24h => coin.volume_24h,
            SortField::TotalVolume => coin.total_volume,
            SortField::Change24h => coin.change_ratio(),
            SortField::Price => coin.price,
            SortField::UniqueHolders => Decimal::from(coin.unique_holders),
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mcap" | "marketcap" | "market_cap" => Ok(SortField::MarketCap),
            "vol" | "volume" | "volume24h" => Ok(SortField::Volume24h),
            "total" | "totalvolume" | "total_volume" => Ok(SortField::TotalVolume),
            "change" | "24h" | "delta" => Ok(SortField::Change24h),
            "price" => Ok(SortField::Price),
            "holders" | "uniqueholders" => Ok(SortField::UniqueHolders),
            other => Err(format!("unknown sort column: {}", other)),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortField::MarketCap => "Market Cap",
            SortField::Volume24h => "24h Volume",
            SortField::TotalVolume => "Total Volume",
            SortField::Change24h => "24h Change",
            SortField::Price => "Price",
            SortField::UniqueHolders => "Holders",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            field: SortField::MarketCap,
            direction: SortDirection::Descending,
        }
    }
}

impl SortState {
    /// Selecting the active column flips direction; a new column starts descending.
    pub fn select(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = SortDirection::Descending;
        }
    }

    /// Stable sort of a copy of `coins`.
    pub fn apply(&self, coins: &[CreatorCoin]) -> Vec<CreatorCoin> {
        let mut sorted = coins.to_vec();
        sorted.sort_by(|a, b| {
            let ordering = self.field.key(a).cmp(&self.field.key(b));
            match self.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        sorted
    }
}

/// Aggregates shown above the table.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardStats {
    pub total_market_cap: Decimal,
    pub total_volume_24h: Decimal,
    pub total_holders: u64,
    /// Mean of per-coin change ratios.
    pub average_change: Decimal,
    pub top_gainers: Vec<CreatorCoin>,
    pub top_losers: Vec<CreatorCoin>,
}

impl LeaderboardStats {
    pub fn compute(coins: &[CreatorCoin]) -> Self {
        let total_market_cap = coins.iter().map(|c| c.market_cap).sum();
        let total_volume_24h = coins.iter().map(|c| c.volume_24h).sum();
        let total_holders = coins.iter().map(|c| c.unique_holders).sum();

        let average_change = if coins.is_empty() {
            Decimal::ZERO
        } else {
            let sum: Decimal = coins.iter().map(CreatorCoin::change_ratio).sum();
            sum / Decimal::from(coins.len())
        };

        Self {
            total_market_cap,
            total_volume_24h,
            total_holders,
            average_change,
            top_gainers: movers(coins, Ordering::Greater),
            top_losers: movers(coins, Ordering::Less),
        }
    }
}

/// Coins whose delta has the given sign, strongest relative move first.
fn movers(coins: &[CreatorCoin], sign: Ordering) -> Vec<CreatorCoin> {
    let mut picked: Vec<CreatorCoin> = coins
        .iter()
        .filter(|c| c.market_cap_delta_24h.cmp(&Decimal::ZERO) == sign)
        .cloned()
        .collect();

    picked.sort_by(|a, b| match sign {
        Ordering::Less => a.change_ratio().cmp(&b.change_ratio()),
        _ => b.change_ratio().cmp(&a.change_ratio()),
    });
    picked.truncate(HIGHLIGHT_COUNT);
    picked
}

#[derive(Debug, Clone, PartialEq)]
pub enum LeaderboardScreen {
    Loading,
    /// Failed before any data arrived.
    Failed(String),
    Ready {
        rows: Vec<CreatorCoin>,
        stats: LeaderboardStats,
        /// Error of the latest refresh while older rows are still shown.
        stale_error: Option<String>,
    },
}

impl LeaderboardScreen {
    pub fn build(snapshot: &Snapshot<Vec<CreatorCoin>>, sort: &SortState) -> Self {
        match (&snapshot.data, &snapshot.error) {
            (None, None) => LeaderboardScreen::Loading,
            (None, Some(error)) => LeaderboardScreen::Failed(error.clone()),
            (Some(coins), error) => {
                let rows = sort.apply(coins);
                let stats = LeaderboardStats::compute(&rows);
                LeaderboardScreen::Ready {
                    rows,
                    stats,
                    stale_error: error.clone(),
                }
            }
        }
    }
}
