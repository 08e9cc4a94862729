pub mod normalize;
pub mod service;

pub use service::{BatchEntry, CoinService, HolderBreakdown, ServiceLimits};
