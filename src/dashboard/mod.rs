//! Terminal dashboard that polls the query API.

pub mod client;
pub mod detail;
pub mod format;
pub mod leaderboard;
pub mod poller;
pub mod render;

use anyhow::Result;
use chrono::Utc;
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};

pub use client::{Board, BoardClient};

use crate::config::{Config, DashboardConfig};
use crate::models::ActivityEvent;
use crate::web::models::{CoinResponse, HoldersResponse};
use client::{ActivityFetch, CoinFetch, HoldersFetch, LeaderboardFetch};
use detail::DetailScreen;
use leaderboard::{LeaderboardScreen, SortField, SortState};
use poller::{PollConfig, Poller, RefreshReason, RetryPolicy, Snapshot};
use render::{render_detail, render_leaderboard};

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

/// A line typed on stdin while a dashboard is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Refresh,
    Sort(SortField),
    Quit,
}

impl Command {
    /// `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };

        match verb.to_ascii_lowercase().as_str() {
            "r" | "refresh" => Ok(Some(Command::Refresh)),
            "q" | "quit" | "exit" => Ok(Some(Command::Quit)),
            "s" | "sort" => {
                let column = words.next().ok_or("usage: s <column>")?;
                Ok(Some(Command::Sort(column.parse()?)))
            }
            other => Err(format!("unknown command: {}", other)),
        }
    }
}

fn poll_config(config: &DashboardConfig, interval_secs: u64) -> PollConfig {
    PollConfig {
        interval: Duration::from_secs(interval_secs.max(1)),
        retry: RetryPolicy {
            max_retries: config.retry_count,
            delay: Duration::from_secs(config.retry_delay_secs),
        },
    }
}

fn draw(screen: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = write!(stdout, "{}{}", CLEAR_SCREEN, screen);
    let _ = stdout.flush();
}

enum Event {
    Changed,
    Input(std::io::Result<Option<String>>),
    Quit,
}

/// Resolves when the receiver sees a new snapshot; never resolves when absent.
async fn next_change<T>(rx: &mut Option<watch::Receiver<Snapshot<T>>>) {
    match rx {
        Some(rx) => {
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}

async fn first_cycle<T>(rx: &mut watch::Receiver<Snapshot<T>>) -> Result<Snapshot<T>> {
    Ok(rx.wait_for(|s| s.cycles >= 1).await?.clone())
}

// ============================================================================
// Leaderboard
// ============================================================================

pub async fn run_leaderboard(config: &Config, board: Board, once: bool) -> Result<()> {
    let client = BoardClient::new(&config.dashboard.server_url, config.http_timeout())?;
    let poller = Poller::spawn(
        board.title(),
        LeaderboardFetch { client, board },
        poll_config(&config.dashboard, config.dashboard.leaderboard_poll_secs),
    );
    let mut sort = SortState::default();
    let mut snapshots = poller.subscribe();

    if once {
        let snapshot = first_cycle(&mut snapshots).await?;
        let screen = LeaderboardScreen::build(&snapshot, &sort);
        print!("{}", render_leaderboard(board.title(), &screen, &sort, snapshot.last_updated));
        if let LeaderboardScreen::Failed(error) = screen {
            anyhow::bail!("Failed to load leaderboard: {}", error);
        }
        return Ok(());
    }

    info!("Showing {} from {}", board.title(), config.dashboard.server_url);
    let refresh = poller.refresh_handle();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut notice: Option<String> = None;

    loop {
        let snapshot = poller.snapshot();
        let screen = LeaderboardScreen::build(&snapshot, &sort);
        let mut text = render_leaderboard(board.title(), &screen, &sort, snapshot.last_updated);
        if let Some(message) = notice.take() {
            text.push_str(&message);
            text.push('\n');
        }
        draw(&text);

        let event = tokio::select! {
            changed = snapshots.changed() => match changed {
                Ok(()) => Event::Changed,
                Err(_) => Event::Quit,
            },
            line = lines.next_line(), if stdin_open => Event::Input(line),
            _ = tokio::signal::ctrl_c() => Event::Quit,
        };

        match event {
            Event::Changed => {}
            Event::Quit => break,
            Event::Input(Ok(None)) | Event::Input(Err(_)) => stdin_open = false,
            Event::Input(Ok(Some(line))) => match Command::parse(&line) {
                Ok(Some(Command::Quit)) => break,
                Ok(Some(Command::Refresh)) => {
                    refresh.trigger(RefreshReason::Manual);
                }
                Ok(Some(Command::Sort(field))) => sort.select(field),
                Ok(None) => {}
                Err(message) => notice = Some(message),
            },
        }
    }

    poller.stop();
    Ok(())
}

// ============================================================================
// Coin detail
// ============================================================================

/// Holder and activity polls, started once the coin address is known.
struct CoinSections {
    address: String,
    holders: Poller<HoldersResponse>,
    activity: Poller<Vec<ActivityEvent>>,
}

impl CoinSections {
    fn spawn(config: &DashboardConfig, client: &BoardClient, address: &str) -> Self {
        Self {
            address: address.to_string(),
            holders: Poller::spawn(
                "holders",
                HoldersFetch {
                    client: client.clone(),
                    address: address.to_string(),
                },
                poll_config(config, config.holders_poll_secs),
            ),
            activity: Poller::spawn(
                "activity",
                ActivityFetch {
                    client: client.clone(),
                    address: address.to_string(),
                },
                poll_config(config, config.activity_poll_secs),
            ),
        }
    }

    fn refresh(&self, reason: RefreshReason) {
        self.holders.refresh_handle().trigger(reason);
        self.activity.refresh_handle().trigger(reason);
    }

    fn stop(&self) {
        self.holders.stop();
        self.activity.stop();
    }
}

fn coin_address(snapshot: &Snapshot<CoinResponse>) -> Option<String> {
    snapshot
        .data
        .as_ref()
        .and_then(|r| r.creator_coin.as_ref())
        .map(|c| c.address.clone())
}

fn build_detail(
    coin: &Snapshot<CoinResponse>,
    sections: Option<&CoinSections>,
) -> DetailScreen {
    let (holders, activity) = match sections {
        Some(s) => (s.holders.snapshot(), s.activity.snapshot()),
        None => (Snapshot::default(), Snapshot::default()),
    };
    DetailScreen::build(coin, &holders, &activity, Utc::now())
}

pub async fn run_coin(config: &Config, identifier: &str, once: bool) -> Result<()> {
    let dashboard = &config.dashboard;
    let client = BoardClient::new(&dashboard.server_url, config.http_timeout())?;
    let coin_poller = Poller::spawn(
        "coin",
        CoinFetch {
            client: client.clone(),
            identifier: identifier.to_string(),
        },
        poll_config(dashboard, dashboard.coin_poll_secs),
    );
    let mut coin_rx = coin_poller.subscribe();

    if once {
        let coin = first_cycle(&mut coin_rx).await?;
        let sections = match coin_address(&coin) {
            Some(address) => {
                let sections = CoinSections::spawn(dashboard, &client, &address);
                first_cycle(&mut sections.holders.subscribe()).await?;
                first_cycle(&mut sections.activity.subscribe()).await?;
                Some(sections)
            }
            None => None,
        };

        let screen = build_detail(&coin, sections.as_ref());
        print!("{}", render_detail(identifier, &screen, coin.last_updated));
        if let Some(sections) = &sections {
            sections.stop();
        }
        if let DetailScreen::Failed(error) = screen {
            anyhow::bail!("Failed to load {}: {}", identifier, error);
        }
        return Ok(());
    }

    let mut sections: Option<CoinSections> = None;
    let mut holders_rx = None;
    let mut activity_rx = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        let coin = coin_poller.snapshot();

        // Start or retarget the section polls when the resolved address changes.
        if let Some(address) = coin_address(&coin) {
            if sections.as_ref().map(|s| s.address != address).unwrap_or(true) {
                if let Some(old) = &sections {
                    old.stop();
                }
                info!("Tracking holders and activity for {}", address);
                let spawned = CoinSections::spawn(dashboard, &client, &address);
                holders_rx = Some(spawned.holders.subscribe());
                activity_rx = Some(spawned.activity.subscribe());
                sections = Some(spawned);
            }
        }

        let screen = build_detail(&coin, sections.as_ref());
        draw(&render_detail(identifier, &screen, coin.last_updated));

        let event = tokio::select! {
            changed = coin_rx.changed() => match changed {
                Ok(()) => Event::Changed,
                Err(_) => Event::Quit,
            },
            _ = next_change(&mut holders_rx) => Event::Changed,
            _ = next_change(&mut activity_rx) => Event::Changed,
            line = lines.next_line(), if stdin_open => Event::Input(line),
            _ = tokio::signal::ctrl_c() => Event::Quit,
        };

        match event {
            Event::Changed => {}
            Event::Quit => break,
            Event::Input(Ok(None)) | Event::Input(Err(_)) => stdin_open = false,
            Event::Input(Ok(Some(line))) => match Command::parse(&line) {
                Ok(Some(Command::Quit)) => break,
                Ok(Some(Command::Refresh)) => {
                    coin_poller.refresh_handle().trigger(RefreshReason::Manual);
                    if let Some(s) = &sections {
                        s.refresh(RefreshReason::Manual);
                    }
                }
                Ok(Some(Command::Sort(_))) => warn!("Sorting only applies to the leaderboard"),
                Ok(None) => {}
                Err(message) => warn!("{}", message),
            },
        }
    }

    coin_poller.stop();
    if let Some(s) = &sections {
        s.stop();
    }
    Ok(())
}
