//! API route definitions

use axum::{routing::get, Router};

use super::handlers;
use super::AppState;

/// Create all API routes
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/api/health", get(handlers::health_check))

        // Single and batch coin lookup
        .route("/api/coin", get(handlers::get_coin))
        .route("/api/coins/batch", get(handlers::get_coins_batch))

        // Per-coin breakdowns
        .route("/api/coins/holders", get(handlers::get_coin_holders))
        .route("/api/coins/activity", get(handlers::get_coin_activity))

        // Leaderboards
        .route("/api/top-creators", get(handlers::get_top_creators))
        .route("/api/top-gainers", get(handlers::get_top_gainers))

        // Add state to all routes
        .with_state(state)
}
