use std::collections::HashMap;

use log::info;
use thiserror::Error;

use crate::api::kraken::mapper::translate_pair;
use crate::api::{ApiError, ExchangeClient, TradesQuery};
use crate::models::{epoch_to_local, ExportWindow, PortfolioTransaction, TradeRecord};
use crate::recorder::{RecorderError, TransactionRecorder};

#[derive(Error, Debug)]
pub enum ForwardError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Recorder(#[from] RecorderError),

    #[error("Trade {txid} has an invalid timestamp: {time}")]
    InvalidTime { txid: String, time: f64 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForwardSummary {
    pub forwarded: usize,
    pub pages_fetched: usize,
    /// Distinct pairs looked up on the public endpoint
    pub pairs_resolved: usize,
}

/// Sends the account's trade history to a transaction recorder
pub struct TradeForwarder<'a, C: ExchangeClient + ?Sized> {
    client: &'a C,
    /// Pair code -> (base, quote), filled during one `forward` call
    pairs: HashMap<String, (String, String)>,
}

impl<'a, C: ExchangeClient + ?Sized> TradeForwarder<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            pairs: HashMap::new(),
        }
    }

    /// All trades in the window, newest first, following `ofs` until `count` is reached
    pub async fn fetch_trades(&self, window: Option<ExportWindow>) -> Result<(Vec<TradeRecord>, usize), ApiError> {
        let mut trades = Vec::new();
        let mut pages = 0;

        loop {
            let page = self
                .client
                .fetch_trades(TradesQuery {
                    start: window.map(|w| w.start),
                    end: window.map(|w| w.end),
                    ofs: (!trades.is_empty()).then_some(trades.len() as u64),
                })
                .await?;
            pages += 1;

            let received = page.trades.len();
            trades.extend(page.trades);

            let exhausted = match page.count {
                Some(count) => trades.len() as u64 >= count,
                None => true,
            };
            if received == 0 || exhausted {
                break;
            }
        }

        info!("Loaded Kraken History: {} trades", trades.len());
        Ok((trades, pages))
    }

    async fn resolve_pair(&mut self, code: &str) -> Result<(String, String), ApiError> {
        if let Some(pair) = self.pairs.get(code) {
            return Ok(pair.clone());
        }

        let info = self.client.fetch_asset_pair(code).await?;
        let tickers = translate_pair(&info);
        self.pairs.insert(code.to_string(), tickers.clone());
        Ok(tickers)
    }

    pub async fn forward<R: TransactionRecorder + ?Sized>(
        &mut self,
        window: Option<ExportWindow>,
        recorder: &mut R,
    ) -> Result<ForwardSummary, ForwardError> {
        self.pairs.clear();

        let (trades, pages_fetched) = self.fetch_trades(window).await?;
        let mut summary = ForwardSummary {
            pages_fetched,
            ..ForwardSummary::default()
        };

        for trade in trades {
            let (crypto_symbol, fiat_symbol) = self.resolve_pair(&trade.pair).await?;

            let transaction_time =
                epoch_to_local(trade.time).ok_or_else(|| ForwardError::InvalidTime {
                    txid: trade.txid.clone(),
                    time: trade.time,
                })?;

            let transaction = PortfolioTransaction {
                transaction_type: trade.side,
                crypto_symbol,
                fiat_symbol,
                amount: trade.vol,
                price: trade.price,
                transaction_time,
                fee: trade.fee,
                note: format!(
                    "Automated entry ordertxid: {} postxid: {}",
                    trade.ordertxid, trade.postxid
                ),
            };

            recorder.add_transaction(&transaction).await?;
            summary.forwarded += 1;
        }

        summary.pairs_resolved = self.pairs.len();
        info!(
            "Forwarded {} trades ({} pairs resolved)",
            summary.forwarded, summary.pairs_resolved
        );
        Ok(summary)
    }
}
