//! Interval polling with immediate refresh triggers and bounded retry.
//!
//! A [`Poller`] owns one background task that re-runs a [`Fetch`] on a fixed
//! interval, or right away when a [`RefreshHandle`] is triggered (focus,
//! reconnect, manual). There is no deduplication window: every trigger issues a
//! fresh request. The last good result stays in the [`Snapshot`] when later
//! fetches fail.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Why a fetch cycle started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    Mount,
    Interval,
    Focus,
    Reconnect,
    Manual,
}

/// Fixed-count, fixed-spacing retry after a failed fetch.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub retry: RetryPolicy,
}

impl PollConfig {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            retry: RetryPolicy::default(),
        }
    }
}

/// Client-side cache of one polled resource.
#[derive(Debug)]
pub struct Snapshot<T> {
    /// Last successful result.
    pub data: Option<Arc<T>>,
    /// Error of the last cycle, cleared by the next success.
    pub error: Option<String>,
    pub in_flight: bool,
    pub last_updated: Option<DateTime<Utc>>,
    /// Completed fetch cycles, successful or not.
    pub cycles: u64,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            in_flight: self.in_flight,
            last_updated: self.last_updated,
            cycles: self.cycles,
        }
    }
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            in_flight: false,
            last_updated: None,
            cycles: 0,
        }
    }
}

impl<T> Snapshot<T> {
    /// Nothing loaded yet and nothing failed yet.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.error.is_none()
    }
}

/// One request against the query surface.
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    async fn fetch(&self) -> Result<Self::Output>;
}

/// Requests an immediate refresh of a running poller.
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    tx: mpsc::Sender<RefreshReason>,
}

impl RefreshHandle {
    /// Returns false when the poller has stopped or its queue is full.
    pub fn trigger(&self, reason: RefreshReason) -> bool {
        self.tx.try_send(reason).is_ok()
    }
}

pub struct Poller<T> {
    refresh_tx: mpsc::Sender<RefreshReason>,
    snapshot_rx: watch::Receiver<Snapshot<T>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl<T: Send + Sync + 'static> Poller<T> {
    /// Spawns the polling task. The first fetch starts immediately.
    pub fn spawn<F>(name: &str, fetcher: F, config: PollConfig) -> Self
    where
        F: Fetch<Output = T>,
    {
        let (refresh_tx, mut refresh_rx) = mpsc::channel(8);
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        let name = name.to_string();

        info!("Polling {} every {:?}", name, config.interval);

        tokio::spawn(async move {
            let mut timer = interval(config.interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut mounted = false;

            loop {
                let reason = tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Poller {} received shutdown signal", name);
                        break;
                    }
                    Some(reason) = refresh_rx.recv() => reason,
                    _ = timer.tick() => {
                        if mounted { RefreshReason::Interval } else { RefreshReason::Mount }
                    }
                };
                mounted = true;

                debug!("Poller {} refreshing ({:?})", name, reason);
                run_cycle(&name, &fetcher, &config.retry, &snapshot_tx).await;
            }
        });

        Self {
            refresh_tx,
            snapshot_rx,
            shutdown_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.snapshot_rx.clone()
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        self.snapshot_rx.borrow().clone()
    }

    pub fn refresh_handle(&self) -> RefreshHandle {
        RefreshHandle {
            tx: self.refresh_tx.clone(),
        }
    }

    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        // Ignore errors (task already gone)
        let _ = self.shutdown_tx.send(());
    }
}

async fn run_cycle<F: Fetch>(
    name: &str,
    fetcher: &F,
    retry: &RetryPolicy,
    snapshot_tx: &watch::Sender<Snapshot<F::Output>>,
) {
    snapshot_tx.send_modify(|s| s.in_flight = true);

    let mut retries = 0;
    loop {
        match fetcher.fetch().await {
            Ok(value) => {
                snapshot_tx.send_modify(|s| {
                    s.data = Some(Arc::new(value));
                    s.error = None;
                    s.in_flight = false;
                    s.last_updated = Some(Utc::now());
                    s.cycles += 1;
                });
                return;
            }
            Err(e) if retries < retry.max_retries => {
                retries += 1;
                debug!(
                    "Poller {} fetch failed ({:#}), retry {}/{} in {:?}",
                    name, e, retries, retry.max_retries, retry.delay
                );
                tokio::time::sleep(retry.delay).await;
            }
            Err(e) => {
                warn!("Poller {} fetch failed after {} retries: {:#}", name, retries, e);
                snapshot_tx.send_modify(|s| {
                    s.error = Some(format!("{:#}", e));
                    s.in_flight = false;
                    s.cycles += 1;
                });
                return;
            }
        }
    }
}
