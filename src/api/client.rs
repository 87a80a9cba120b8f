use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::models::{LedgerEntry, TradeRecord};

/// Configuration for rate limiting
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

/// Request parameters for the ledger endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerQuery {
    /// Start timestamp (Unix seconds)
    pub start: Option<i64>,
    /// End timestamp (Unix seconds)
    pub end: Option<i64>,
    /// Result offset
    pub ofs: Option<u64>,
}

/// One page of ledger entries, newest first
#[derive(Debug, Clone, Default)]
pub struct LedgerPage {
    pub entries: Vec<LedgerEntry>,
    /// Total number of entries matching the query, as reported by the exchange
    pub count: Option<u64>,
}

/// Request parameters for the trade history endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradesQuery {
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub ofs: Option<u64>,
}

/// One page of trades, newest first
#[derive(Debug, Clone, Default)]
pub struct TradesPage {
    pub trades: Vec<TradeRecord>,
    pub count: Option<u64>,
}

/// Reference data for a tradable pair (public AssetPairs endpoint)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPair {
    /// Exchange pair code the data was requested for (e.g., "XXBTZEUR")
    pub code: String,
    pub altname: Option<String>,
    /// Websocket name (e.g., "XBT/EUR")
    pub wsname: Option<String>,
    pub base: String,
    pub quote: String,
}

/// Exchange operations the exporter, forwarder and CLI rely on
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Fetch one page of ledger entries
    async fn fetch_ledger(&self, query: LedgerQuery) -> Result<LedgerPage, ApiError>;

    /// Fetch one page of trade history
    async fn fetch_trades(&self, query: TradesQuery) -> Result<TradesPage, ApiError>;

    /// Look up reference data for a pair code
    async fn fetch_asset_pair(&self, pair: &str) -> Result<AssetPair, ApiError>;
}
