//! Coin detail view: combines the coin, holder and activity polls.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::poller::Snapshot;
use crate::models::{ActivityEvent, CreatorCoin, Holder, ProfileSummary, SupplySource};
use crate::web::models::{CoinResponse, HoldersResponse};

/// Ranked holders listed below the market slot.
pub const RANKED_HOLDERS: usize = 7;
const RECENT_ACTIVITY: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum HolderSection {
    Loading,
    Unavailable(String),
    Empty,
    Ready {
        market: Option<Holder>,
        ranked: Vec<Holder>,
        supply_source: SupplySource,
    },
}

impl HolderSection {
    fn build(snapshot: &Snapshot<HoldersResponse>) -> Self {
        let Some(response) = &snapshot.data else {
            return match &snapshot.error {
                Some(error) => HolderSection::Unavailable(error.clone()),
                None => HolderSection::Loading,
            };
        };
        if response.items.is_empty() {
            return HolderSection::Empty;
        }

        let mut holders = response.items.iter().cloned();
        let market = match response.items.first() {
            Some(first) if first.is_market => holders.next(),
            _ => None,
        };

        HolderSection::Ready {
            market,
            ranked: holders.take(RANKED_HOLDERS).collect(),
            supply_source: response.supply_source,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActivitySection {
    Loading,
    Unavailable(String),
    Empty,
    Ready(Vec<ActivityEvent>),
}

impl ActivitySection {
    fn build(snapshot: &Snapshot<Vec<ActivityEvent>>) -> Self {
        match (&snapshot.data, &snapshot.error) {
            (None, None) => ActivitySection::Loading,
            (None, Some(error)) => ActivitySection::Unavailable(error.clone()),
            (Some(events), _) if events.is_empty() => ActivitySection::Empty,
            (Some(events), _) => {
                ActivitySection::Ready(events.iter().take(RECENT_ACTIVITY).cloned().collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoinDetail {
    pub coin: CreatorCoin,
    pub profile: Option<ProfileSummary>,
    pub change_ratio: Decimal,
    pub days_since_creation: Option<i64>,
    pub holders: HolderSection,
    pub activity: ActivitySection,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailScreen {
    Loading,
    /// The identifier resolved to no creator coin.
    NotFound,
    Failed(String),
    Ready(Box<CoinDetail>),
}

impl DetailScreen {
    pub fn build(
        coin: &Snapshot<CoinResponse>,
        holders: &Snapshot<HoldersResponse>,
        activity: &Snapshot<Vec<ActivityEvent>>,
        now: DateTime<Utc>,
    ) -> Self {
        let response = match (&coin.data, &coin.error) {
            (None, None) => return DetailScreen::Loading,
            (None, Some(error)) => return DetailScreen::Failed(error.clone()),
            (Some(response), _) => response,
        };
        let Some(creator_coin) = &response.creator_coin else {
            return DetailScreen::NotFound;
        };

        DetailScreen::Ready(Box::new(CoinDetail {
            coin: creator_coin.clone(),
            profile: response.profile.clone(),
            change_ratio: creator_coin.change_ratio(),
            days_since_creation: creator_coin.created_at.map(|created| days_between(created, now)),
            holders: HolderSection::build(holders),
            activity: ActivitySection::build(activity),
        }))
    }
}

/// Whole days elapsed, never negative.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_days().max(0)
}
