//! Plain-text rendering of dashboard screens.

use chrono::{DateTime, Local, Utc};
use rust_decimal::Decimal;
use std::fmt::Write;

use super::detail::{ActivitySection, CoinDetail, DetailScreen, HolderSection};
use super::format::{
    format_balance, format_change, format_currency, format_number, format_price, short_address,
};
use super::leaderboard::{LeaderboardScreen, LeaderboardStats, SortDirection, SortState};
use crate::models::{CreatorCoin, Holder, SupplySource};

const RULE: &str = "------------------------------------------------------------------------------------------";

fn updated_line(out: &mut String, last_updated: Option<DateTime<Utc>>) {
    let when = last_updated
        .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "...".to_string());
    let _ = writeln!(out, "Last updated: {}", when);
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}

// ============================================================================
// Leaderboard
// ============================================================================

pub fn render_leaderboard(
    title: &str,
    screen: &LeaderboardScreen,
    sort: &SortState,
    last_updated: Option<DateTime<Utc>>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "CreatorBoard | {}", title);
    updated_line(&mut out, last_updated);
    let _ = writeln!(out, "{}", RULE);

    match screen {
        LeaderboardScreen::Loading => {
            let _ = writeln!(out, "Loading...");
        }
        LeaderboardScreen::Failed(error) => {
            let _ = writeln!(out, "Error: {}", error);
        }
        LeaderboardScreen::Ready { rows, stats, stale_error } => {
            if let Some(error) = stale_error {
                let _ = writeln!(out, "! Refresh failed, showing previous data: {}", error);
            }
            render_stats(&mut out, stats);
            let _ = writeln!(out, "{}", RULE);
            render_table(&mut out, rows, sort);
        }
    }

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(
        out,
        "[r] refresh  [s <mcap|price|change|vol|total|holders>] sort  [q] quit"
    );
    out
}

fn render_stats(out: &mut String, stats: &LeaderboardStats) {
    let _ = writeln!(
        out,
        "Total market cap {}   24h volume {}   Holders {}   Avg change {}",
        format_currency(stats.total_market_cap),
        format_currency(stats.total_volume_24h),
        format_number(stats.total_holders),
        format_change(stats.average_change, Decimal::ONE),
    );

    let movers = |coins: &[CreatorCoin]| -> String {
        if coins.is_empty() {
            return "none".to_string();
        }
        coins
            .iter()
            .map(|c| format!("{} {}", c.symbol, format_change(c.market_cap_delta_24h, c.market_cap)))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let _ = writeln!(out, "Top gainers: {}", movers(&stats.top_gainers));
    let _ = writeln!(out, "Top losers:  {}", movers(&stats.top_losers));
}

fn render_table(out: &mut String, rows: &[CreatorCoin], sort: &SortState) {
    let arrow = match sort.direction {
        SortDirection::Ascending => "^",
        SortDirection::Descending => "v",
    };
    let _ = writeln!(out, "Sorted by {} {}", sort.field, arrow);
    let _ = writeln!(
        out,
        "{:>4}  {:<22} {:<10} {:>10} {:>10} {:>9} {:>10} {:>10} {:>8}",
        "#", "Creator", "Symbol", "Mkt Cap", "Price", "24h", "Vol 24h", "Total Vol", "Holders"
    );

    if rows.is_empty() {
        let _ = writeln!(out, "No creator coins found.");
        return;
    }

    for (rank, coin) in rows.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:<22} {:<10} {:>10} {:>10} {:>9} {:>10} {:>10} {:>8}",
            rank + 1,
            truncate(&format!("@{}", coin.creator_handle), 22),
            truncate(&coin.symbol, 10),
            format_currency(coin.market_cap),
            format_price(coin.price),
            format_change(coin.market_cap_delta_24h, coin.market_cap),
            format_currency(coin.volume_24h),
            format_currency(coin.total_volume),
            format_number(coin.unique_holders),
        );
    }
}

// ============================================================================
// Coin detail
// ============================================================================

pub fn render_detail(
    identifier: &str,
    screen: &DetailScreen,
    last_updated: Option<DateTime<Utc>>,
) -> String {
    let mut out = String::new();

    match screen {
        DetailScreen::Loading => {
            let _ = writeln!(out, "Loading {}...", identifier);
        }
        DetailScreen::NotFound => {
            let _ = writeln!(out, "Creator coin not found for {}", identifier);
        }
        DetailScreen::Failed(error) => {
            let _ = writeln!(out, "Error: {}", error);
        }
        DetailScreen::Ready(detail) => {
            render_coin(&mut out, detail);
            updated_line(&mut out, last_updated);
        }
    }

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "[r] refresh  [q] quit");
    out
}

fn render_coin(out: &mut String, detail: &CoinDetail) {
    let coin = &detail.coin;
    let _ = writeln!(out, "{} ({})  @{}", coin.label(), coin.symbol, coin.creator_handle);
    let _ = writeln!(out, "#{}", short_address(&coin.address));
    if let Some(bio) = detail.profile.as_ref().and_then(|p| p.bio.as_deref()) {
        let _ = writeln!(out, "{}", truncate(bio, 88));
    }
    let _ = writeln!(out, "{}", RULE);

    let _ = writeln!(
        out,
        "Price {}   24h {}",
        format_price(coin.price),
        format_change(coin.market_cap_delta_24h, coin.market_cap),
    );
    let _ = writeln!(
        out,
        "Market cap {}   Volume 24h {}   Total volume {}   Holders {}",
        format_currency(coin.market_cap),
        format_currency(coin.volume_24h),
        format_currency(coin.total_volume),
        format_number(coin.unique_holders),
    );
    if let (Some(created), Some(days)) = (coin.created_at, detail.days_since_creation) {
        let _ = writeln!(out, "Created {} ({} days ago)", created.format("%Y-%m-%d"), days);
    }

    let _ = writeln!(out, "{}", RULE);
    render_holders(out, &detail.holders);
    let _ = writeln!(out, "{}", RULE);
    render_activity(out, &detail.activity);
}

fn holder_line(rank: &str, holder: &Holder) -> String {
    let name = if holder.is_market {
        format!("{} (pool {})", holder.handle, short_address(&holder.address))
    } else if holder.has_real_handle {
        format!("@{}", holder.handle)
    } else {
        format!("{} [Address]", short_address(&holder.address))
    };
    format!(
        "{:>6}  {:<34} {:>12} {:>7.1}%",
        rank,
        truncate(&name, 34),
        format_balance(holder.balance),
        holder.percentage,
    )
}

fn render_holders(out: &mut String, section: &HolderSection) {
    let _ = writeln!(out, "Top holders");
    match section {
        HolderSection::Loading => {
            let _ = writeln!(out, "  Loading holders...");
        }
        HolderSection::Unavailable(error) => {
            let _ = writeln!(out, "  Holders unavailable: {}", error);
        }
        HolderSection::Empty => {
            let _ = writeln!(out, "  No holders found.");
        }
        HolderSection::Ready {
            market,
            ranked,
            supply_source,
        } => {
            if let Some(market) = market {
                let _ = writeln!(out, "{}", holder_line("Market", market));
            }
            for (i, holder) in ranked.iter().enumerate() {
                let _ = writeln!(out, "{}", holder_line(&format!("#{}", i + 1), holder));
            }
            match supply_source {
                SupplySource::Reported => {}
                SupplySource::Derived => {
                    let _ = writeln!(out, "  (percentages use supply estimated from market cap / price)");
                }
                SupplySource::Unknown => {
                    let _ = writeln!(out, "  (total supply unknown, percentages unavailable)");
                }
            }
        }
    }
}

fn render_activity(out: &mut String, section: &ActivitySection) {
    let _ = writeln!(out, "Recent activity");
    match section {
        ActivitySection::Loading => {
            let _ = writeln!(out, "  Loading activity...");
        }
        ActivitySection::Unavailable(error) => {
            let _ = writeln!(out, "  Activity unavailable: {}", error);
        }
        ActivitySection::Empty => {
            let _ = writeln!(out, "  No recent trades.");
        }
        ActivitySection::Ready(events) => {
            for event in events {
                let _ = writeln!(
                    out,
                    "{:>6}  {:<4} {:<18} {:>12} {:>10}",
                    event.time,
                    event.action,
                    truncate(&event.actor, 18),
                    format_balance(event.amount),
                    format_currency(event.value),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::poller::Snapshot;
    use crate::models::fixtures::sample_coin;
    use crate::web::models::{CoinResponse, HoldersResponse};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[test]
    fn test_leaderboard_ready_render() {
        let snapshot = Snapshot {
            data: Some(Arc::new(vec![
                sample_coin("0xa", dec!(1_500_000), dec!(150_000)),
                sample_coin("0xb", dec!(2_000), dec!(-500)),
            ])),
            ..Default::default()
        };
        let sort = SortState::default();
        let screen = LeaderboardScreen::build(&snapshot, &sort);
        let text = render_leaderboard("Top Creator Coins", &screen, &sort, None);

        assert!(text.contains("Top Creator Coins"));
        assert!(text.contains("Last updated: ..."));
        assert!(text.contains("$1.5M"));
        assert!(text.contains("+10.0%"));
        assert!(text.contains("-25.0%"));
        assert!(text.contains("Top gainers: 0XA +10.0%"));
        assert!(text.contains("Top losers:  0XB -25.0%"));
        assert!(text.find("@creator_0xa").unwrap() < text.find("@creator_0xb").unwrap());
    }

    #[test]
    fn test_leaderboard_failed_and_empty() {
        let sort = SortState::default();
        let text = render_leaderboard("t", &LeaderboardScreen::Failed("boom".to_string()), &sort, None);
        assert!(text.contains("Error: boom"));

        let snapshot = Snapshot {
            data: Some(Arc::new(Vec::new())),
            ..Default::default()
        };
        let text = render_leaderboard("t", &LeaderboardScreen::build(&snapshot, &sort), &sort, None);
        assert!(text.contains("No creator coins found."));
        assert!(text.contains("Top gainers: none"));
    }

    #[test]
    fn test_detail_render_with_market_and_address_badge() {
        let coin = Snapshot {
            data: Some(Arc::new(CoinResponse {
                profile: None,
                creator_coin: Some(sample_coin("0xcoin", dec!(1000), dec!(10))),
            })),
            ..Default::default()
        };
        let holders = Snapshot {
            data: Some(Arc::new(HoldersResponse {
                items: vec![
                    Holder {
                        address: "0x1111111111111111111111111111111111111111".to_string(),
                        handle: "Market".to_string(),
                        balance: dec!(600),
                        percentage: dec!(60),
                        profile_image: None,
                        is_market: true,
                        has_real_handle: false,
                    },
                    Holder {
                        address: "0x2222222222222222222222222222222222222222".to_string(),
                        handle: "0x2222...2222".to_string(),
                        balance: dec!(100),
                        percentage: dec!(10),
                        profile_image: None,
                        is_market: false,
                        has_real_handle: false,
                    },
                ],
                supply_source: SupplySource::Derived,
            })),
            ..Default::default()
        };

        let screen = DetailScreen::build(&coin, &holders, &Snapshot::default(), Utc::now());
        let text = render_detail("0xcoin", &screen, None);

        assert!(text.contains("Market"));
        assert!(text.contains("0x22222222...222222 [Address]"));
        assert!(text.contains("estimated from market cap"));
        assert!(text.contains("Loading activity..."));
    }

    #[test]
    fn test_detail_not_found() {
        let text = render_detail("@ghost", &DetailScreen::NotFound, None);
        assert!(text.contains("Creator coin not found for @ghost"));
    }
}
