use super::types::{KrakenAssetPair, KrakenLedgerEntry, KrakenTrade};
use crate::api::client::AssetPair;
use crate::models::{LedgerEntry, TradeRecord};

/// Legacy Kraken asset codes and their conventional tickers
const LEGACY_TICKERS: &[(&str, &str)] = &[("XBT", "BTC"), ("XDG", "DOGE")];

/// Map a Kraken ledger entry (keyed by its ledger id) to LedgerEntry
pub fn map_ledger_entry(txid: &str, entry: KrakenLedgerEntry) -> LedgerEntry {
    LedgerEntry {
        txid: txid.to_string(),
        refid: entry.refid,
        time: entry.time,
        entry_type: entry.entry_type,
        subtype: entry.subtype,
        aclass: entry.aclass,
        asset: entry.asset,
        amount: entry.amount,
        fee: entry.fee,
        balance: entry.balance,
    }
}

/// Map a Kraken trade (keyed by its trade id) to TradeRecord
pub fn map_trade(txid: &str, trade: KrakenTrade) -> TradeRecord {
    TradeRecord {
        txid: txid.to_string(),
        ordertxid: trade.ordertxid,
        postxid: trade.postxid,
        pair: trade.pair,
        time: trade.time,
        side: trade.side,
        ordertype: trade.ordertype,
        price: trade.price,
        cost: trade.cost,
        fee: trade.fee,
        vol: trade.vol,
    }
}

pub fn map_asset_pair(code: &str, pair: KrakenAssetPair) -> AssetPair {
    AssetPair {
        code: code.to_string(),
        altname: pair.altname,
        wsname: pair.wsname,
        base: pair.base,
        quote: pair.quote,
    }
}

/// Replace legacy asset codes with conventional tickers ("XBT" -> "BTC", "XDG" -> "DOGE")
pub fn normalize_ticker(code: &str) -> String {
    LEGACY_TICKERS
        .iter()
        .fold(code.to_string(), |acc, (legacy, modern)| acc.replace(legacy, modern))
}

/// Strip Kraken's asset class prefix from four-letter codes ("XXBT" -> "XBT", "ZEUR" -> "EUR")
fn strip_class_prefix(code: &str) -> &str {
    if code.len() == 4 && (code.starts_with('X') || code.starts_with('Z')) {
        &code[1..]
    } else {
        code
    }
}

/// Resolve a pair to (base, quote) tickers.
///
/// Uses the websocket name ("XBT/XDG") when present, otherwise the pair's base and quote codes.
pub fn translate_pair(pair: &AssetPair) -> (String, String) {
    if let Some((base, quote)) = pair.wsname.as_deref().and_then(|ws| ws.split_once('/')) {
        return (normalize_ticker(base), normalize_ticker(quote));
    }

    (
        normalize_ticker(strip_class_prefix(&pair.base)),
        normalize_ticker(strip_class_prefix(&pair.quote)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(wsname: Option<&str>, base: &str, quote: &str) -> AssetPair {
        AssetPair {
            code: "TEST".to_string(),
            altname: None,
            wsname: wsname.map(str::to_string),
            base: base.to_string(),
            quote: quote.to_string(),
        }
    }

    #[test]
    fn test_legacy_bitcoin_and_dogecoin_codes() {
        assert_eq!(
            translate_pair(&pair(Some("XBT/XDG"), "XXBT", "XXDG")),
            ("BTC".to_string(), "DOGE".to_string())
        );
    }

    #[test]
    fn test_modern_codes_pass_through() {
        assert_eq!(
            translate_pair(&pair(Some("ETH/EUR"), "XETH", "ZEUR")),
            ("ETH".to_string(), "EUR".to_string())
        );
    }

    #[test]
    fn test_fallback_without_wsname() {
        assert_eq!(
            translate_pair(&pair(None, "XXBT", "ZUSD")),
            ("BTC".to_string(), "USD".to_string())
        );
        assert_eq!(
            translate_pair(&pair(None, "DOT", "USDT")),
            ("DOT".to_string(), "USDT".to_string())
        );
    }

    #[test]
    fn test_map_trade_keeps_ids() {
        let trade = KrakenTrade {
            ordertxid: "OQCLML-BW3P3-BUCMWZ".to_string(),
            postxid: "TKH2SE-M7IF5-CFI7LT".to_string(),
            pair: "XXBTZUSD".to_string(),
            time: 1688667796.8802,
            side: "buy".to_string(),
            ordertype: "limit".to_string(),
            price: "30010.00000".to_string(),
            cost: "600.20000".to_string(),
            fee: "0.00000".to_string(),
            vol: "0.02000000".to_string(),
        };

        let record = map_trade("TRWCIF-3MJWU-5DYJG5", trade);
        assert_eq!(record.txid, "TRWCIF-3MJWU-5DYJG5");
        assert_eq!(record.ordertxid, "OQCLML-BW3P3-BUCMWZ");
        assert_eq!(record.side, "buy");
    }
}
