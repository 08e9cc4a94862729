//! HTTP query surface
//!
//! Read-only JSON endpoints over [`CoinService`]. Nothing is cached server side;
//! every response tells clients not to cache either.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod server;

use std::sync::Arc;

use crate::config::Config;
use crate::market::CoinService;

/// Shared application state for all API handlers
#[derive(Clone)]
pub struct AppState {
    /// Aggregation service over the coin data API
    pub coin_service: Arc<CoinService>,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState instance
    pub fn new(coin_service: Arc<CoinService>, config: Arc<Config>) -> Self {
        Self { coin_service, config }
    }
}
