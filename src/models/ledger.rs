use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

/// A single accounting event from the exchange ledger.
///
/// Amounts are kept as the exchange's decimal strings so the CSV carries
/// exactly what the exchange reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub txid: String,
    pub refid: String,
    /// Unix seconds with sub-second precision
    pub time: f64,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub subtype: String,
    pub aclass: String,
    pub asset: String,
    pub amount: String,
    pub fee: String,
    pub balance: String,
}

impl LedgerEntry {
    /// Entry timestamp in the local timezone
    pub fn local_time(&self) -> Option<DateTime<Local>> {
        epoch_to_local(self.time)
    }
}

/// Convert fractional Unix seconds to a local timestamp
pub fn epoch_to_local(time: f64) -> Option<DateTime<Local>> {
    if !time.is_finite() {
        return None;
    }
    let secs = time.floor();
    let nanos = ((time - secs) * 1_000_000_000.0).round().min(999_999_999.0) as u32;
    Local.timestamp_opt(secs as i64, nanos).single()
}

/// Time range handed to the exporter, in Unix seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportWindow {
    pub start: i64,
    pub end: i64,
}

impl ExportWindow {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// `[YYYY.MM.DD - YYYY.MM.DD]` label used in generated filenames
    pub fn label(&self) -> String {
        let fmt = |ts: i64| {
            Local
                .timestamp_opt(ts, 0)
                .single()
                .map(|dt| dt.format("%Y.%m.%d").to_string())
                .unwrap_or_else(|| ts.to_string())
        };
        format!("[{} - {}]", fmt(self.start), fmt(self.end))
    }
}
