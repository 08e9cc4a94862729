use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A creator coin as served to dashboard clients. Only constructed from records that
/// passed validation, so `market_cap` is always positive when built server side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorCoin {
    pub address: String,
    pub name: String,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub creator_handle: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub market_cap: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub volume_24h: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_volume: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub market_cap_delta_24h: Decimal, // signed
    pub unique_holders: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl CreatorCoin {
    /// 24h change as a fraction of market cap. Zero when market cap is zero.
    pub fn change_ratio(&self) -> Decimal {
        self.market_cap_delta_24h
            .checked_div(self.market_cap)
            .unwrap_or(Decimal::ZERO)
    }

    /// Name to show in tables: display name when registered, coin name otherwise.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Subset of the creator profile returned alongside a single-coin lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub public_wallet: Option<String>,
    #[serde(default)]
    pub creator_coin_address: Option<String>,
}

/// Result of resolving one identifier.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoinLookup {
    pub profile: Option<ProfileSummary>,
    pub creator_coin: Option<CreatorCoin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holder {
    pub address: String,
    pub handle: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub percentage: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    /// The automated market-maker position, always the first upstream slot.
    pub is_market: bool,
    pub has_real_handle: bool,
}

/// Where the total supply used for holder percentages came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplySource {
    /// `totalSupply` reported by the data API.
    Reported,
    /// Approximated as `marketCap / price`.
    Derived,
    /// Neither available; percentages are zero.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "Buy"),
            TradeAction::Sell => write!(f, "Sell"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    /// Relative age such as `5m`, `3h` or `now`.
    pub time: String,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub action: TradeAction,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// USD value at swap time.
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    pub transaction_ref: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::sample_coin;
    use rust_decimal_macros::dec;

    #[test]
    fn test_change_ratio() {
        let coin = sample_coin("a", dec!(1000), dec!(-250));
        assert_eq!(coin.change_ratio(), dec!(-0.25));
    }

    #[test]
    fn test_change_ratio_zero_market_cap() {
        let coin = sample_coin("a", Decimal::ZERO, dec!(5));
        assert_eq!(coin.change_ratio(), Decimal::ZERO);
    }

    #[test]
    fn test_coin_json_field_names() {
        let coin = sample_coin("0xabc", dec!(1500.5), dec!(12));
        let value = serde_json::to_value(&coin).unwrap();

        assert_eq!(value["marketCap"], serde_json::json!(1500.5));
        assert!(value.get("volume24h").is_some());
        assert!(value.get("marketCapDelta24h").is_some());
        assert!(value.get("creatorHandle").is_some());
        assert!(value.get("displayName").is_none());
    }

    #[test]
    fn test_supply_source_serialization() {
        assert_eq!(serde_json::to_string(&SupplySource::Derived).unwrap(), "\"derived\"");
    }
}
