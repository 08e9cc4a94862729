pub mod coin;

// Re-export commonly used types
pub use coin::{
    ActivityEvent, CoinLookup, CreatorCoin, Holder, ProfileSummary, SupplySource, TradeAction,
};
