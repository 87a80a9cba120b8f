use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A filled trade from the exchange's trade history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub txid: String,
    /// Order responsible for the trade
    pub ordertxid: String,
    /// Position the trade belongs to (empty for spot trades)
    pub postxid: String,
    /// Exchange pair code (e.g., "XXBTZEUR")
    pub pair: String,
    pub time: f64,
    /// "buy" or "sell"
    pub side: String,
    pub ordertype: String,
    pub price: String,
    pub cost: String,
    pub fee: String,
    pub vol: String,
}

/// Normalized transaction handed to a portfolio recorder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTransaction {
    pub transaction_type: String,
    pub crypto_symbol: String,
    pub fiat_symbol: String,
    pub amount: String,
    pub price: String,
    pub transaction_time: DateTime<Local>,
    pub fee: String,
    pub note: String,
}
