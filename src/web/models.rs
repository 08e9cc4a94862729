//! Request and Response DTOs for the Web API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::market::{BatchEntry, HolderBreakdown};
use crate::models::{CoinLookup, CreatorCoin, Holder, ProfileSummary, SupplySource};

// ============================================================================
// Health & Errors
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CoinQuery {
    pub identifier: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    /// Comma-separated wallet addresses or handles.
    pub identifiers: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    pub address: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

/// Generic list envelope: `{ "items": [...] }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemsResponse<T> {
    pub items: Vec<T>,
}

/// `creatorCoin` is `null` when the identifier resolves to nothing.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinResponse {
    pub profile: Option<ProfileSummary>,
    pub creator_coin: Option<CreatorCoin>,
}

impl From<CoinLookup> for CoinResponse {
    fn from(lookup: CoinLookup) -> Self {
        Self {
            profile: lookup.profile,
            creator_coin: lookup.creator_coin,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub identifier: String,
    pub creator_coin: Option<CreatorCoin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<BatchEntry> for BatchItem {
    fn from(entry: BatchEntry) -> Self {
        Self {
            identifier: entry.identifier,
            creator_coin: entry.creator_coin,
            error: entry.error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldersResponse {
    pub items: Vec<Holder>,
    pub supply_source: SupplySource,
}

impl From<HolderBreakdown> for HoldersResponse {
    fn from(breakdown: HolderBreakdown) -> Self {
        Self {
            items: breakdown.holders,
            supply_source: breakdown.supply_source,
        }
    }
}
