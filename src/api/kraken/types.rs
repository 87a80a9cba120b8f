use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;

/// Kraken API response wrapper: `{"error": [...], "result": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct KrakenResponse<T> {
    #[serde(default)]
    pub error: Vec<String>,
    pub result: Option<T>,
}

impl<T> KrakenResponse<T> {
    /// Split into the data or the exchange's error messages
    pub fn into_result(self) -> Result<T, ApiError> {
        if !self.error.is_empty() {
            return Err(ApiError::ExchangeError { messages: self.error });
        }
        self.result
            .ok_or_else(|| ApiError::ParseError("Response has no result".to_string()))
    }
}

/// Result of `/0/private/Ledgers`, keyed by ledger id in the exchange's order
#[derive(Debug, Clone, Deserialize)]
pub struct LedgersResult {
    pub ledger: IndexMap<String, KrakenLedgerEntry>,
    pub count: Option<u64>,
}

/// Ledger entry as returned by Kraken
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KrakenLedgerEntry {
    pub refid: String,
    /// Unix seconds, fractional
    pub time: f64,
    /// "trade", "deposit", "withdrawal", "staking", ...
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(default)]
    pub subtype: String,
    pub aclass: String,
    pub asset: String,
    pub amount: String,
    pub fee: String,
    pub balance: String,
}

/// Result of `/0/private/TradesHistory`
#[derive(Debug, Clone, Deserialize)]
pub struct TradesHistoryResult {
    pub trades: IndexMap<String, KrakenTrade>,
    pub count: Option<u64>,
}

/// Trade as returned by Kraken
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KrakenTrade {
    pub ordertxid: String,
    #[serde(default)]
    pub postxid: String,
    pub pair: String,
    pub time: f64,
    /// "buy" or "sell"
    #[serde(rename = "type")]
    pub side: String,
    #[serde(default)]
    pub ordertype: String,
    pub price: String,
    #[serde(default)]
    pub cost: String,
    pub fee: String,
    pub vol: String,
}

/// Entry of `/0/public/AssetPairs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KrakenAssetPair {
    pub altname: Option<String>,
    pub wsname: Option<String>,
    pub base: String,
    pub quote: String,
}

pub type AssetPairsResult = IndexMap<String, KrakenAssetPair>;
