//! Field normalization for upstream coin records.
//!
//! Turns the loosely typed wire records into [`CreatorCoin`], [`Holder`] and
//! [`ActivityEvent`]. Every amount goes through `Decimal`; base-unit balances are
//! rescaled exactly rather than divided in floating point. USD figures are taken
//! as-is: the API already quotes them in USD and no conversion factor is applied.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::api::zora::{RawBalance, RawCoin, RawNumber, RawProfile, RawProfileRef, RawSwap};
use crate::models::{ActivityEvent, CreatorCoin, Holder, ProfileSummary, SupplySource, TradeAction};

/// Decimal places of coin base units.
pub const BASE_UNIT_DECIMALS: u32 = 18;

/// Label of the first holder slot, the market-maker position.
pub const MARKET_HOLDER_LABEL: &str = "Market";

/// Why an upstream record was dropped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("record has no address")]
    MissingAddress,

    #[error("record has no creator handle")]
    MissingCreatorHandle,

    #[error("record has no symbol")]
    MissingSymbol,

    #[error("market cap {0} is not positive")]
    NonPositiveMarketCap(Decimal),

    #[error("field {field} is malformed: {value:?}")]
    Malformed { field: &'static str, value: String },

    #[error("unknown activity type {0:?}")]
    UnknownActivity(String),
}

/// How strictly a coin record is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Leaderboard entries: a registered creator handle is required.
    Listing,
    /// Single-coin lookups: the creator address stands in for a missing handle.
    Detail,
}

fn malformed(field: &'static str, value: impl Into<String>) -> Rejection {
    Rejection::Malformed { field, value: value.into() }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Parses a decimal string or JSON number, accepting exponent notation.
pub fn parse_decimal(raw: &RawNumber, field: &'static str) -> Result<Decimal, Rejection> {
    let text = raw.as_text();
    if text.is_empty() {
        return Err(malformed(field, text));
    }
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| malformed(field, text))
}

/// Like [`parse_decimal`] but an absent field reads as zero.
fn parse_or_zero(raw: Option<&RawNumber>, field: &'static str) -> Result<Decimal, Rejection> {
    match raw {
        Some(raw) => parse_decimal(raw, field),
        None => Ok(Decimal::ZERO),
    }
}

/// Converts an integer amount in base units to display units.
///
/// Integer input is rescaled without any arithmetic, so `10^18` base units is
/// exactly `1`. Fractional or exponent input falls back to a checked division.
pub fn base_units_to_display(
    raw: &RawNumber,
    decimals: u32,
    field: &'static str,
) -> Result<Decimal, Rejection> {
    let text = raw.as_text();

    let value = match text.parse::<i128>() {
        Ok(units) => Decimal::try_from_i128_with_scale(units, decimals)
            .map_err(|_| malformed(field, text.clone()))?,
        Err(_) => {
            let units = parse_decimal(raw, field)?;
            let divisor = Decimal::from_i128_with_scale(10i128.pow(decimals), 0);
            units
                .checked_div(divisor)
                .ok_or_else(|| malformed(field, text.clone()))?
        }
    };

    if value.is_sign_negative() && !value.is_zero() {
        return Err(malformed(field, text));
    }
    Ok(value.normalize())
}

/// Shortens an address to `0x1234...abcd`.
pub fn truncate_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    match (address.get(..6), address.get(address.len() - 4..)) {
        (Some(head), Some(tail)) => format!("{}...{}", head, tail),
        _ => address.to_string(),
    }
}

/// Age of `then` relative to `now`: `now`, `Xm` below an hour, `Xh` beyond.
pub fn relative_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    if seconds <= 0 {
        return "now".to_string();
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        format!("{}m", minutes)
    } else {
        format!("{}h", minutes / 60)
    }
}

fn profile_handle(profile: Option<&RawProfileRef>) -> Option<String> {
    profile.and_then(|p| non_empty(p.handle.as_ref()))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

// ============================================================================
// Coins
// ============================================================================

/// Validates and converts one coin record. Pure: the same input always yields
/// the same output.
pub fn normalize_coin(raw: &RawCoin, mode: ValidationMode) -> Result<CreatorCoin, Rejection> {
    let address = non_empty(raw.address.as_ref()).ok_or(Rejection::MissingAddress)?;

    let profile = raw.creator_profile.as_ref();
    let creator_handle = match (profile_handle(profile), mode) {
        (Some(handle), _) => handle,
        (None, ValidationMode::Detail) => {
            non_empty(raw.creator_address.as_ref()).ok_or(Rejection::MissingCreatorHandle)?
        }
        (None, ValidationMode::Listing) => return Err(Rejection::MissingCreatorHandle),
    };

    let symbol = non_empty(raw.symbol.as_ref()).ok_or(Rejection::MissingSymbol)?;

    let market_cap = parse_or_zero(raw.market_cap.as_ref(), "marketCap")?;
    if market_cap <= Decimal::ZERO {
        return Err(Rejection::NonPositiveMarketCap(market_cap));
    }

    let price = parse_or_zero(
        raw.token_price.as_ref().and_then(|p| p.price_in_usdc.as_ref()),
        "tokenPrice.priceInUsdc",
    )?;

    let unique_holders = match raw.unique_holders.as_ref() {
        Some(n) => {
            let count = parse_decimal(n, "uniqueHolders")?;
            count
                .trunc()
                .to_u64()
                .ok_or_else(|| malformed("uniqueHolders", n.as_text()))?
        }
        None => 0,
    };

    Ok(CreatorCoin {
        name: non_empty(raw.name.as_ref()).unwrap_or_else(|| symbol.clone()),
        address,
        symbol,
        display_name: profile.and_then(|p| non_empty(p.display_name.as_ref())),
        creator_handle,
        market_cap,
        volume_24h: parse_or_zero(raw.volume_24h.as_ref(), "volume24h")?,
        total_volume: parse_or_zero(raw.total_volume.as_ref(), "totalVolume")?,
        price,
        market_cap_delta_24h: parse_or_zero(raw.market_cap_delta_24h.as_ref(), "marketCapDelta24h")?,
        unique_holders,
        created_at: raw.created_at.as_deref().and_then(parse_timestamp),
        profile_image: profile.and_then(|p| p.avatar.as_ref()).and_then(|a| a.medium_url()),
    })
}

pub fn profile_summary(raw: &RawProfile) -> ProfileSummary {
    ProfileSummary {
        handle: non_empty(raw.handle.as_ref()),
        display_name: non_empty(raw.display_name.as_ref()),
        bio: non_empty(raw.bio.as_ref()),
        avatar: raw.avatar.as_ref().and_then(|a| a.medium_url()),
        public_wallet: raw
            .public_wallet
            .as_ref()
            .and_then(|w| non_empty(w.wallet_address.as_ref())),
        creator_coin_address: raw
            .creator_coin
            .as_ref()
            .and_then(|c| non_empty(c.address.as_ref())),
    }
}

// ============================================================================
// Holders
// ============================================================================

/// Total supply for percentage math: the reported figure when present, otherwise
/// `marketCap / price`.
pub fn estimate_supply(coin: Option<&RawCoin>) -> (Option<Decimal>, SupplySource) {
    let Some(coin) = coin else {
        return (None, SupplySource::Unknown);
    };

    let reported = coin
        .total_supply
        .as_ref()
        .and_then(|s| parse_decimal(s, "totalSupply").ok())
        .filter(|s| *s > Decimal::ZERO);
    if let Some(supply) = reported {
        return (Some(supply), SupplySource::Reported);
    }

    let market_cap = coin.market_cap.as_ref().and_then(|m| parse_decimal(m, "marketCap").ok());
    let price = coin
        .token_price
        .as_ref()
        .and_then(|p| p.price_in_usdc.as_ref())
        .and_then(|p| parse_decimal(p, "tokenPrice.priceInUsdc").ok());

    match (market_cap, price) {
        (Some(cap), Some(price)) if cap > Decimal::ZERO && price > Decimal::ZERO => {
            match cap.checked_div(price) {
                Some(supply) => (Some(supply), SupplySource::Derived),
                None => (None, SupplySource::Unknown),
            }
        }
        _ => (None, SupplySource::Unknown),
    }
}

/// Converts one balance. `position` is the index in the upstream list; position 0
/// is always the market slot.
pub fn normalize_holder(
    position: usize,
    raw: &RawBalance,
    supply: Option<Decimal>,
) -> Result<Holder, Rejection> {
    let address = non_empty(raw.owner_address.as_ref()).ok_or(Rejection::MissingAddress)?;
    let balance = raw
        .balance
        .as_ref()
        .ok_or_else(|| malformed("balance", ""))
        .and_then(|b| base_units_to_display(b, BASE_UNIT_DECIMALS, "balance"))?;

    let percentage = supply
        .filter(|s| *s > Decimal::ZERO)
        .and_then(|s| balance.checked_div(s))
        .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
        .map(|p| p.round_dp(4))
        .unwrap_or(Decimal::ZERO);

    let profile = raw.owner_profile.as_ref();
    let profile_image = profile.and_then(|p| p.avatar.as_ref()).and_then(|a| a.medium_url());

    if position == 0 {
        return Ok(Holder {
            address,
            handle: MARKET_HOLDER_LABEL.to_string(),
            balance,
            percentage,
            profile_image: None,
            is_market: true,
            has_real_handle: false,
        });
    }

    let (handle, has_real_handle) = match profile_handle(profile) {
        Some(handle) => (handle, true),
        None => (truncate_address(&address), false),
    };

    Ok(Holder {
        address,
        handle,
        balance,
        percentage,
        profile_image,
        is_market: false,
        has_real_handle,
    })
}

// ============================================================================
// Swaps
// ============================================================================

pub fn classify_activity(activity_type: Option<&str>) -> Result<TradeAction, Rejection> {
    let tag = activity_type.map(str::trim).unwrap_or_default();
    match tag.to_ascii_uppercase().as_str() {
        "BUY" => Ok(TradeAction::Buy),
        "SELL" => Ok(TradeAction::Sell),
        _ => Err(Rejection::UnknownActivity(tag.to_string())),
    }
}

pub fn normalize_swap(raw: &RawSwap, now: DateTime<Utc>) -> Result<ActivityEvent, Rejection> {
    let action = classify_activity(raw.activity_type.as_deref())?;

    let amount = raw
        .coin_amount
        .as_ref()
        .ok_or_else(|| malformed("coinAmount", ""))
        .and_then(|a| base_units_to_display(a, BASE_UNIT_DECIMALS, "coinAmount"))?;

    let price = parse_or_zero(
        raw.currency_amount_with_price.as_ref().and_then(|c| c.price_usdc.as_ref()),
        "currencyAmountWithPrice.priceUsdc",
    )?;
    let value = amount
        .checked_mul(price)
        .ok_or_else(|| malformed("currencyAmountWithPrice.priceUsdc", price.to_string()))?
        .normalize();

    let raw_timestamp = raw.block_timestamp.as_deref().unwrap_or_default();
    let timestamp =
        parse_timestamp(raw_timestamp).ok_or_else(|| malformed("blockTimestamp", raw_timestamp))?;

    let actor = match profile_handle(raw.sender_profile.as_ref()) {
        Some(handle) => handle,
        None => non_empty(raw.sender_address.as_ref())
            .map(|a| truncate_address(&a))
            .ok_or(Rejection::MissingAddress)?,
    };

    Ok(ActivityEvent {
        time: relative_age(timestamp, now),
        timestamp,
        actor,
        action,
        amount,
        value,
        transaction_ref: raw.transaction_hash.clone().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::zora::{RawAvatar, RawPreviewImage, RawSwapPrice, RawTokenPrice};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn text(s: &str) -> RawNumber {
        RawNumber::Text(s.to_string())
    }

    fn raw_coin(address: &str, handle: Option<&str>, market_cap: &str) -> RawCoin {
        RawCoin {
            address: Some(address.to_string()),
            name: Some("Alice Coin".to_string()),
            symbol: Some("ALICE".to_string()),
            market_cap: Some(text(market_cap)),
            market_cap_delta_24h: Some(text("-12.5")),
            volume_24h: Some(text("340.25")),
            total_volume: None,
            unique_holders: Some(RawNumber::Number(serde_json::Number::from(77))),
            created_at: Some("2025-06-01T12:00:00Z".to_string()),
            creator_address: Some("0xcreator0000000000000000000000000000000001".to_string()),
            creator_profile: handle.map(|h| RawProfileRef {
                handle: Some(h.to_string()),
                display_name: Some("Alice".to_string()),
                avatar: Some(RawAvatar {
                    preview_image: Some(RawPreviewImage {
                        small: None,
                        medium: Some("https://img/alice.png".to_string()),
                    }),
                }),
            }),
            token_price: Some(RawTokenPrice { price_in_usdc: Some(text("0.0125")) }),
            ..Default::default()
        }
    }

    #[test]
    fn test_one_token_in_base_units_is_exactly_one() {
        let display = base_units_to_display(&text("1000000000000000000"), 18, "balance").unwrap();
        assert_eq!(display, Decimal::ONE);
        assert_eq!(display.to_string(), "1");
    }

    #[test]
    fn test_base_units_beyond_f64_precision() {
        // 123456789.123456789123456789 tokens, more digits than an f64 can hold
        let display =
            base_units_to_display(&text("123456789123456789123456789"), 18, "balance").unwrap();
        assert_eq!(display, dec!(123456789.123456789123456789));
    }

    #[test]
    fn test_base_units_from_json_number_and_exponent() {
        let from_number =
            base_units_to_display(&RawNumber::Number(serde_json::Number::from(500_000_000_000_000_000u64)), 18, "balance")
                .unwrap();
        assert_eq!(from_number, dec!(0.5));

        let from_exponent = base_units_to_display(&text("2.5e18"), 18, "balance").unwrap();
        assert_eq!(from_exponent, dec!(2.5));
    }

    #[test]
    fn test_base_units_rejects_garbage_and_negative() {
        assert!(base_units_to_display(&text("lots"), 18, "balance").is_err());
        assert!(base_units_to_display(&text("-1000"), 18, "balance").is_err());
    }

    #[test]
    fn test_normalize_coin_valid() {
        let coin = normalize_coin(&raw_coin("0xabc", Some("alice"), "125000.55"), ValidationMode::Listing)
            .unwrap();

        assert_eq!(coin.address, "0xabc");
        assert_eq!(coin.creator_handle, "alice");
        assert_eq!(coin.display_name.as_deref(), Some("Alice"));
        assert_eq!(coin.market_cap, dec!(125000.55));
        assert_eq!(coin.market_cap_delta_24h, dec!(-12.5));
        assert_eq!(coin.volume_24h, dec!(340.25));
        assert_eq!(coin.total_volume, Decimal::ZERO);
        assert_eq!(coin.unique_holders, 77);
        assert_eq!(coin.profile_image.as_deref(), Some("https://img/alice.png"));
        assert!(coin.created_at.is_some());
    }

    #[test]
    fn test_usd_fields_are_not_converted() {
        // Regression guard: prices once came out near 0.0086 after a stray FX multiplier.
        let mut raw = raw_coin("0xabc", Some("alice"), "1000000");
        raw.token_price = Some(RawTokenPrice { price_in_usdc: Some(text("1.0")) });

        let coin = normalize_coin(&raw, ValidationMode::Listing).unwrap();
        assert_eq!(coin.price, Decimal::ONE);
        assert_eq!(coin.market_cap, dec!(1000000));
        assert!(!(coin.price > dec!(0.008) && coin.price < dec!(0.009)));
    }

    #[test]
    fn test_normalize_coin_is_idempotent() {
        let raw = raw_coin("0xabc", Some("alice"), "98765.4321");
        let first = normalize_coin(&raw, ValidationMode::Listing).unwrap();
        let second = normalize_coin(&raw, ValidationMode::Listing).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.market_cap.serialize(), second.market_cap.serialize());
    }

    #[test]
    fn test_validity_rejections() {
        assert_eq!(
            normalize_coin(&raw_coin("", Some("alice"), "10"), ValidationMode::Listing),
            Err(Rejection::MissingAddress)
        );
        assert_eq!(
            normalize_coin(&raw_coin("0xabc", None, "10"), ValidationMode::Listing),
            Err(Rejection::MissingCreatorHandle)
        );
        assert_eq!(
            normalize_coin(&raw_coin("0xabc", Some("alice"), "0"), ValidationMode::Listing),
            Err(Rejection::NonPositiveMarketCap(Decimal::ZERO))
        );

        let mut no_symbol = raw_coin("0xabc", Some("alice"), "10");
        no_symbol.symbol = Some("  ".to_string());
        assert_eq!(normalize_coin(&no_symbol, ValidationMode::Listing), Err(Rejection::MissingSymbol));

        let mut missing_cap = raw_coin("0xabc", Some("alice"), "10");
        missing_cap.market_cap = None;
        assert!(matches!(
            normalize_coin(&missing_cap, ValidationMode::Listing),
            Err(Rejection::NonPositiveMarketCap(_))
        ));
    }

    #[test]
    fn test_detail_mode_falls_back_to_creator_address() {
        let coin = normalize_coin(&raw_coin("0xabc", None, "10"), ValidationMode::Detail).unwrap();
        assert_eq!(coin.creator_handle, "0xcreator0000000000000000000000000000000001");
    }

    #[test]
    fn test_name_falls_back_to_symbol() {
        let mut raw = raw_coin("0xabc", Some("alice"), "10");
        raw.name = None;
        assert_eq!(normalize_coin(&raw, ValidationMode::Listing).unwrap().name, "ALICE");
    }

    #[test]
    fn test_relative_age() {
        let now = Utc::now();
        assert_eq!(relative_age(now, now), "now");
        assert_eq!(relative_age(now + Duration::seconds(30), now), "now");
        assert_eq!(relative_age(now - Duration::minutes(5), now), "5m");
        assert_eq!(relative_age(now - Duration::minutes(59), now), "59m");
        assert_eq!(relative_age(now - Duration::minutes(125), now), "2h");
    }

    #[test]
    fn test_truncate_address() {
        assert_eq!(
            truncate_address("0x1234567890abcdef1234567890abcdef12345678"),
            "0x1234...5678"
        );
        assert_eq!(truncate_address("0xshort"), "0xshort");
    }

    #[test]
    fn test_estimate_supply() {
        let mut coin = raw_coin("0xabc", Some("alice"), "1000");
        coin.token_price = Some(RawTokenPrice { price_in_usdc: Some(text("0.001")) });
        assert_eq!(estimate_supply(Some(&coin)), (Some(dec!(1000000)), SupplySource::Derived));

        coin.total_supply = Some(text("1000000000"));
        assert_eq!(estimate_supply(Some(&coin)), (Some(dec!(1000000000)), SupplySource::Reported));

        coin.total_supply = None;
        coin.token_price = None;
        assert_eq!(estimate_supply(Some(&coin)), (None, SupplySource::Unknown));
        assert_eq!(estimate_supply(None), (None, SupplySource::Unknown));
    }

    fn balance(owner: &str, units: &str, handle: Option<&str>) -> RawBalance {
        RawBalance {
            balance: Some(text(units)),
            owner_address: Some(owner.to_string()),
            owner_profile: handle.map(|h| RawProfileRef {
                handle: Some(h.to_string()),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_first_holder_is_market() {
        let raw = balance("0xpool000000000000000000000000000000000000", "500000000000000000000000", Some("someone"));
        let holder = normalize_holder(0, &raw, Some(dec!(1000000))).unwrap();

        assert_eq!(holder.handle, "Market");
        assert!(holder.is_market);
        assert!(!holder.has_real_handle);
        assert_eq!(holder.balance, dec!(500000));
        assert_eq!(holder.percentage, dec!(50));
    }

    #[test]
    fn test_holder_handle_fallback() {
        let named = normalize_holder(1, &balance("0xaaaa000000000000000000000000000000001111", "1000000000000000000", Some("bob")), None)
            .unwrap();
        assert_eq!(named.handle, "bob");
        assert!(named.has_real_handle);
        assert_eq!(named.percentage, Decimal::ZERO);

        let anonymous = normalize_holder(2, &balance("0xaaaa000000000000000000000000000000001111", "1000000000000000000", None), None)
            .unwrap();
        assert_eq!(anonymous.handle, "0xaaaa...1111");
        assert!(!anonymous.has_real_handle);
    }

    fn swap(kind: &str, units: &str, price: &str, timestamp: &str) -> RawSwap {
        RawSwap {
            activity_type: Some(kind.to_string()),
            coin_amount: Some(text(units)),
            sender_address: Some("0xbbbb000000000000000000000000000000002222".to_string()),
            sender_profile: None,
            block_timestamp: Some(timestamp.to_string()),
            transaction_hash: Some("0xtx".to_string()),
            currency_amount_with_price: Some(RawSwapPrice { price_usdc: Some(text(price)) }),
        }
    }

    #[test]
    fn test_normalize_swap() {
        let now = DateTime::parse_from_rfc3339("2025-06-01T12:10:00Z").unwrap().with_timezone(&Utc);
        let event = normalize_swap(&swap("SELL", "2500000000000000000", "0.2", "2025-06-01T12:00:00Z"), now)
            .unwrap();

        assert_eq!(event.action, TradeAction::Sell);
        assert_eq!(event.amount, dec!(2.5));
        assert_eq!(event.value, dec!(0.5));
        assert_eq!(event.time, "10m");
        assert_eq!(event.actor, "0xbbbb...2222");
        assert_eq!(event.transaction_ref, "0xtx");
    }

    #[test]
    fn test_swap_rejections() {
        let now = Utc::now();
        assert_eq!(
            normalize_swap(&swap("MINT", "1", "1", "2025-06-01T12:00:00Z"), now),
            Err(Rejection::UnknownActivity("MINT".to_string()))
        );
        assert!(normalize_swap(&swap("buy", "1", "1", "yesterday"), now).is_err());
        assert_eq!(classify_activity(Some("buy")), Ok(TradeAction::Buy));
    }
}
