//! Request handlers for all API endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::{error, info, warn};

use super::models::*;
use super::AppState;
use crate::error::DashboardError;
use crate::models::{ActivityEvent, CreatorCoin};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn bad_request(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    warn!("Rejected request: {}", message);
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
            details: None,
        }),
    )
}

/// Maps service errors: caller mistakes are 400, everything else 500.
fn service_error(context: &str, e: DashboardError) -> (StatusCode, Json<ErrorResponse>) {
    if e.is_validation() {
        return bad_request(&e.to_string());
    }
    error!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
            details: Some(context.to_string()),
        }),
    )
}

/// Returns the trimmed value of a required query parameter.
fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Splits a comma-separated list, trimming entries and dropping empty ones.
pub fn parse_identifier_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Health Check
// ============================================================================

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

// ============================================================================
// Coins
// ============================================================================

pub async fn get_coin(
    State(state): State<AppState>,
    Query(query): Query<CoinQuery>,
) -> ApiResult<CoinResponse> {
    let identifier = required(query.identifier.as_deref())
        .ok_or_else(|| bad_request("identifier is required"))?;

    let lookup = state
        .coin_service
        .get_coin(identifier)
        .await
        .map_err(|e| service_error("Failed to load creator coin", e))?;

    Ok(Json(CoinResponse::from(lookup)))
}

pub async fn get_coins_batch(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
) -> ApiResult<ItemsResponse<BatchItem>> {
    let raw = query
        .identifiers
        .as_deref()
        .ok_or_else(|| bad_request("identifiers is required (comma-separated)"))?;

    let identifiers = parse_identifier_list(raw);
    if identifiers.is_empty() {
        return Err(bad_request("no identifiers provided"));
    }

    info!("Batch lookup of {} identifiers", identifiers.len());
    let entries = state.coin_service.get_coins_batch(&identifiers).await;

    Ok(Json(ItemsResponse {
        items: entries.into_iter().map(BatchItem::from).collect(),
    }))
}

pub async fn get_coin_holders(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> ApiResult<HoldersResponse> {
    let address = required(query.address.as_deref())
        .ok_or_else(|| bad_request("address is required"))?;

    let breakdown = state
        .coin_service
        .get_holders(address)
        .await
        .map_err(|e| service_error("Failed to load holders", e))?;

    Ok(Json(HoldersResponse::from(breakdown)))
}

pub async fn get_coin_activity(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> ApiResult<ItemsResponse<ActivityEvent>> {
    let address = required(query.address.as_deref())
        .ok_or_else(|| bad_request("address is required"))?;

    let items = state
        .coin_service
        .get_recent_activity(address)
        .await
        .map_err(|e| service_error("Failed to load activity", e))?;

    Ok(Json(ItemsResponse { items }))
}

// ============================================================================
// Leaderboards
// ============================================================================

pub async fn get_top_creators(State(state): State<AppState>) -> ApiResult<ItemsResponse<CreatorCoin>> {
    let items = state.coin_service.list_top_creators().await;
    Ok(Json(ItemsResponse { items }))
}

pub async fn get_top_gainers(State(state): State<AppState>) -> ApiResult<ItemsResponse<CreatorCoin>> {
    let items = state.coin_service.list_top_gainers().await;
    Ok(Json(ItemsResponse { items }))
}
