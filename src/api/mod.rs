pub mod client;
pub mod error;
pub mod kraken;
pub mod rate_limiter;

pub use client::{
    AssetPair, ExchangeClient, LedgerPage, LedgerQuery, RateLimitConfig, TradesPage, TradesQuery,
};
pub use error::ApiError;
pub use kraken::KrakenClient;
pub use rate_limiter::RateLimiter;
