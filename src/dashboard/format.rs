//! Display formatting for dashboard values.

use rust_decimal::prelude::*;

const THOUSAND: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);
const MILLION: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
const BILLION: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

fn fixed(value: Decimal, dp: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        rounded = Decimal::ZERO; // no "-0.0"
    }
    format!("{:.*}", dp as usize, rounded)
}

/// `$1.2B`, `$3.4M`, `$5.6K`, or `$7.8` below a thousand.
pub fn format_currency(amount: Decimal) -> String {
    let body = if amount >= BILLION {
        format!("{}B", fixed(amount / BILLION, 1))
    } else if amount >= MILLION {
        format!("{}M", fixed(amount / MILLION, 1))
    } else if amount >= THOUSAND {
        format!("{}K", fixed(amount / THOUSAND, 1))
    } else {
        fixed(amount, 1)
    };
    format!("${}", body)
}

/// 24h change as a percentage of market cap, one decimal. `0.0%` for a zero market cap.
pub fn format_percentage(change: Decimal, market_cap: Decimal) -> String {
    let ratio = change.checked_div(market_cap).unwrap_or(Decimal::ZERO);
    format!("{}%", fixed(ratio * Decimal::ONE_HUNDRED, 1))
}

/// Like [`format_percentage`] with an explicit `+` on non-negative changes.
pub fn format_change(change: Decimal, market_cap: Decimal) -> String {
    let formatted = format_percentage(change, market_cap);
    if formatted.starts_with('-') {
        formatted
    } else {
        format!("+{}", formatted)
    }
}

pub fn format_price(price: Decimal) -> String {
    format!("${}", fixed(price, 4))
}

/// Holder counts: `1.2M`, `3.4K`, or the plain integer.
pub fn format_number(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{}M", fixed(Decimal::from(count) / MILLION, 1))
    } else if count >= 1_000 {
        format!("{}K", fixed(Decimal::from(count) / THOUSAND, 1))
    } else {
        count.to_string()
    }
}

/// Token balances, two decimals with compact suffixes for large holdings.
pub fn format_balance(balance: Decimal) -> String {
    if balance >= MILLION {
        format!("{}M", fixed(balance / MILLION, 2))
    } else if balance >= THOUSAND {
        format!("{}K", fixed(balance / THOUSAND, 2))
    } else {
        fixed(balance, 2)
    }
}

/// `0x12345678...abcdef` for addresses long enough to shorten.
pub fn short_address(address: &str) -> String {
    if address.len() <= 16 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..10], &address[address.len() - 6..])
}
